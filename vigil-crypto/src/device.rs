//! Device identity generation.

use rand::RngCore;
use vigil_types::DeviceId;

/// Number of random bytes in a device identifier (144 bits).
const DEVICE_ID_BYTES: usize = 18;

/// Generates a fresh device identifier.
///
/// 144 random bits encoded URL-safe without padding (24 characters);
/// collision probability is negligible at account scale.
pub fn generate_device_id() -> DeviceId {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    let mut bytes = [0u8; DEVICE_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    DeviceId::from_string(URL_SAFE_NO_PAD.encode(bytes))
}
