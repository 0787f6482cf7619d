use rand::Rng;

/// Length of generated authorization codes
pub const CODE_LENGTH: usize = 22;

/// Length of generated access tokens, refresh tokens and consent tokens
pub const TOKEN_LENGTH: usize = 32;

/// Length of generated client secrets
pub const CLIENT_SECRET_LENGTH: usize = 16;

/// Character set for opaque tokens and authorization codes (63 characters)
const TOKEN_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.";

/// Character set for client secrets (alphanumeric + punctuation)
const SECRET_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*-_=+";

/// Generate a random opaque string of the given length
///
/// The RNG is seeded from the operating system and is safe for concurrent
/// use (one generator per thread). No used-token bookkeeping is kept:
/// at 32 characters over a 63-character alphabet the collision probability
/// is negligible, and the token store's key uniqueness would surface any
/// hypothetical collision.
pub fn opaque_token(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_CHARSET.len());
            TOKEN_CHARSET[idx] as char
        })
        .collect()
}

/// Generate an authorization code (22 characters)
pub fn authorization_code() -> String {
    opaque_token(CODE_LENGTH)
}

/// Generate an access, refresh or consent token (32 characters)
pub fn token() -> String {
    opaque_token(TOKEN_LENGTH)
}

/// Generate a password-grade client secret (16 characters including punctuation)
pub fn client_secret() -> String {
    let mut rng = rand::thread_rng();

    (0..CLIENT_SECRET_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..SECRET_CHARSET.len());
            SECRET_CHARSET[idx] as char
        })
        .collect()
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
