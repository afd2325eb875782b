//! toe-device wire protocol
//!
//! Command framing and button-record layout for communicating with a
//! toe-device peripheral over the serial characteristic pair.

use crate::domain::layout::Button;

/// toe-device serial service UUID
pub const SERVICE_UUID: &str = "713d0000-503e-4c75-ba94-3148f18d941e";

/// Data characteristic UUID - layout stream notifications arrive here
pub const DATA_CHAR_UUID: &str = "713d0002-503e-4c75-ba94-3148f18d941e";

/// Command characteristic UUID - where commands are written
pub const COMMAND_CHAR_UUID: &str = "713d0003-503e-4c75-ba94-3148f18d941e";

/// Size of one button record on the wire.
///
/// ```text
/// [0]      : Button id (u8)
/// [1]      : X position (u8)
/// [2]      : Y position (u8)
/// [3]      : Width (u8)
/// [4]      : Height (u8)
/// [5]      : Border flag (0 = none, non-zero = bordered)
/// [6]      : Image name length (u8, 0 = no image)
/// [7-56]   : Label, NUL-padded C string (50 bytes)
/// [57-312] : Image name, NUL-padded C string (256 bytes)
/// ```
pub const BUTTON_RECORD_LEN: usize = 313;

/// Maximum label length carried in a record
pub const LABEL_FIELD_LEN: usize = 50;

/// Maximum image-name length carried in a record
pub const IMAGE_FIELD_LEN: usize = 256;

/// Commands sent to the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the peripheral to stream its button layout
    LayoutRequest,
    /// Press the button with the given id
    ButtonPress(u8),
}

impl Command {
    /// Get the 2-byte wire encoding for this command
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            Self::LayoutRequest => [0x00, 0x00],
            Self::ButtonPress(id) => [0x01, id],
        }
    }
}

/// Decode one `BUTTON_RECORD_LEN`-byte record into a [`Button`].
///
/// The label and image name are C strings inside fixed-width fields; bytes
/// up to the first NUL are taken and decoded lossily (the peripheral side
/// gives no UTF-8 guarantee).
pub fn parse_button_record(bytes: &[u8]) -> Button {
    debug_assert_eq!(bytes.len(), BUTTON_RECORD_LEN);

    let image_len = (bytes[6] as usize).min(IMAGE_FIELD_LEN);
    let label = c_string_field(&bytes[7..7 + LABEL_FIELD_LEN]);
    let image = if image_len > 0 {
        Some(c_string_field(&bytes[57..57 + image_len]))
    } else {
        None
    };

    Button {
        id: bytes[0],
        x: bytes[1],
        y: bytes[2],
        width: bytes[3],
        height: bytes[4],
        border: bytes[5] != 0,
        label,
        image,
        active: false,
    }
}

/// Encode a [`Button`] into its wire record.
///
/// Used by the peripheral emulator and by tests; the inverse of
/// [`parse_button_record`]. Overlong label/image strings are truncated to
/// their field widths, matching the server's `strncpy` behavior.
pub fn encode_button_record(button: &Button) -> [u8; BUTTON_RECORD_LEN] {
    let mut buf = [0u8; BUTTON_RECORD_LEN];
    buf[0] = button.id;
    buf[1] = button.x;
    buf[2] = button.y;
    buf[3] = button.width;
    buf[4] = button.height;
    buf[5] = u8::from(button.border);

    let label = button.label.as_bytes();
    let label_len = label.len().min(LABEL_FIELD_LEN - 1);
    buf[7..7 + label_len].copy_from_slice(&label[..label_len]);

    if let Some(image) = &button.image {
        let image = image.as_bytes();
        let image_len = image.len().min(IMAGE_FIELD_LEN - 1);
        buf[6] = image_len as u8;
        buf[57..57 + image_len].copy_from_slice(&image[..image_len]);
    }

    buf
}

fn c_string_field(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_button() -> Button {
        Button {
            id: 7,
            x: 10,
            y: 20,
            width: 80,
            height: 40,
            border: true,
            label: "Lights".to_string(),
            image: Some("bulb.png".to_string()),
            active: false,
        }
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::LayoutRequest.to_bytes(), [0x00, 0x00]);
        assert_eq!(Command::ButtonPress(0x07).to_bytes(), [0x01, 0x07]);
        assert_eq!(Command::ButtonPress(0xFF).to_bytes(), [0x01, 0xFF]);
    }

    #[test]
    fn test_record_round_trip() {
        let button = sample_button();
        let record = encode_button_record(&button);
        assert_eq!(record.len(), BUTTON_RECORD_LEN);

        let parsed = parse_button_record(&record);
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.x, 10);
        assert_eq!(parsed.y, 20);
        assert_eq!(parsed.width, 80);
        assert_eq!(parsed.height, 40);
        assert!(parsed.border);
        assert_eq!(parsed.label, "Lights");
        assert_eq!(parsed.image.as_deref(), Some("bulb.png"));
    }

    #[test]
    fn test_record_without_image() {
        let mut button = sample_button();
        button.image = None;
        let record = encode_button_record(&button);
        assert_eq!(record[6], 0);

        let parsed = parse_button_record(&record);
        assert_eq!(parsed.image, None);
    }

    #[test]
    fn test_overlong_label_truncated() {
        let mut button = sample_button();
        button.label = "x".repeat(200);
        let record = encode_button_record(&button);

        let parsed = parse_button_record(&record);
        assert_eq!(parsed.label.len(), LABEL_FIELD_LEN - 1);
    }

    #[test]
    fn test_label_field_is_nul_terminated() {
        let button = sample_button();
        let record = encode_button_record(&button);
        // Trailing label bytes stay NUL so the C side sees a terminator
        assert_eq!(record[7 + button.label.len()], 0);
        assert_eq!(record[56], 0);
    }
}
