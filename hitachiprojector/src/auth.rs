use md5::{Digest, Md5};

/// Length of the random challenge a projector sends when network
/// authentication is enabled.
pub const CHALLENGE_LEN: usize = 8;

/// Lowercase hex MD5 of `challenge ‖ password`, as both the Hitachi and the
/// PJLink protocols expect it.
pub fn digest(challenge: &[u8], password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(challenge);
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
