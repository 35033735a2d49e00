//! Device configuration descriptors (`ResTable_config`).
//!
//! Every type chunk is tagged with the configuration it applies to. The on-disk structure has
//! grown over platform releases, so its first field is its own size and readers consume only
//! the fields that size covers.

use crate::err::{ArscError, Result};
use crate::utils::ByteCursor;

use log::{debug, warn};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Size of the oldest descriptor layout. Anything smaller is rejected.
pub const MIN_CONFIG_BYTES: u32 = 28;
/// Size of the newest layout this decoder understands.
pub const KNOWN_CONFIG_BYTES: u32 = 56;

pub const MNC_ZERO: i16 = -1;

pub const DENSITY_DEFAULT: u16 = 0;
pub const DENSITY_LOW: u16 = 120;
pub const DENSITY_MEDIUM: u16 = 160;
pub const DENSITY_TV: u16 = 213;
pub const DENSITY_HIGH: u16 = 240;
pub const DENSITY_XHIGH: u16 = 320;
pub const DENSITY_XXHIGH: u16 = 480;
pub const DENSITY_XXXHIGH: u16 = 640;
pub const DENSITY_ANY: u16 = 0xFFFE;
pub const DENSITY_NONE: u16 = 0xFFFF;

const MASK_LAYOUTDIR: u8 = 0xC0;
const MASK_SCREENSIZE: u8 = 0x0F;
const MASK_SCREENLONG: u8 = 0x30;
const MASK_SCREENROUND: u8 = 0x03;
const MASK_WIDE_COLOR_GAMUT: u8 = 0x03;
const MASK_HDR: u8 = 0x0C;
const MASK_UI_MODE_TYPE: u8 = 0x0F;
const MASK_UI_MODE_NIGHT: u8 = 0x30;
const MASK_KEYSHIDDEN: u8 = 0x03;
const MASK_NAVHIDDEN: u8 = 0x0C;

/// A decoded configuration descriptor.
///
/// Equality and hashing are structural over every decoded field plus `is_invalid`; the
/// declared `size` is not part of a descriptor's identity.
#[derive(Debug, Clone, Default)]
pub struct ConfigDescriptor {
    pub size: u32,
    pub mcc: i16,
    pub mnc: i16,
    pub language: String,
    pub region: String,
    pub orientation: u8,
    pub touchscreen: u8,
    pub density: u16,
    pub keyboard: u8,
    pub navigation: u8,
    pub input_flags: u8,
    pub screen_width: u16,
    pub screen_height: u16,
    pub sdk_version: u16,
    pub minor_version: u16,
    pub screen_layout: u8,
    pub ui_mode: u8,
    pub smallest_screen_width_dp: u16,
    pub screen_width_dp: u16,
    pub screen_height_dp: u16,
    pub locale_script: String,
    pub locale_variant: String,
    pub screen_layout2: u8,
    pub color_mode: u8,
    pub grammatical_inflection: u8,
    /// Set when the descriptor carries non-zero data past the fields this decoder knows.
    pub is_invalid: bool,
}

impl ConfigDescriptor {
    /// The default (qualifier-less) configuration.
    pub fn new() -> Self {
        ConfigDescriptor {
            size: MIN_CONFIG_BYTES,
            ..Default::default()
        }
    }

    /// Read a descriptor at the cursor position, consuming exactly its declared size.
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<ConfigDescriptor> {
        let start = cursor.pos();
        let size = cursor.u32_named("config size")?;
        if size < MIN_CONFIG_BYTES {
            return Err(ArscError::ConfigTooSmall {
                size,
                offset: start as u64,
            });
        }

        let mut config = ConfigDescriptor {
            size,
            ..Default::default()
        };

        config.mcc = cursor.i16_named("config mcc")?;
        config.mnc = cursor.i16_named("config mnc")?;
        let language = [cursor.u8_named("config language")?, cursor.u8_named("config language")?];
        config.language = unpack_language_or_region(language, b'a');
        let region = [cursor.u8_named("config region")?, cursor.u8_named("config region")?];
        config.region = unpack_language_or_region(region, b'0');

        config.orientation = cursor.u8_named("config orientation")?;
        config.touchscreen = cursor.u8_named("config touchscreen")?;
        config.density = cursor.u16_named("config density")?;

        config.keyboard = cursor.u8_named("config keyboard")?;
        config.navigation = cursor.u8_named("config navigation")?;
        config.input_flags = cursor.u8_named("config input flags")?;
        cursor.advance(1, "config input pad")?;

        config.screen_width = cursor.u16_named("config screen width")?;
        config.screen_height = cursor.u16_named("config screen height")?;

        config.sdk_version = cursor.u16_named("config sdk version")?;
        config.minor_version = cursor.u16_named("config minor version")?;

        let mut read = MIN_CONFIG_BYTES;

        if size >= 32 {
            config.screen_layout = cursor.u8_named("config screen layout")?;
            config.ui_mode = cursor.u8_named("config ui mode")?;
            config.smallest_screen_width_dp = cursor.u16_named("config smallest width dp")?;
            read = 32;
        }

        if size >= 36 {
            config.screen_width_dp = cursor.u16_named("config screen width dp")?;
            config.screen_height_dp = cursor.u16_named("config screen height dp")?;
            read = 36;
        }

        if size >= 48 {
            config.locale_script = cursor.ascii_fixed_z(4, "config locale script")?;
            config.locale_variant = cursor.ascii_fixed_z(8, "config locale variant")?;
            read = 48;
        }

        if size >= 52 {
            config.screen_layout2 = cursor.u8_named("config screen layout 2")?;
            config.color_mode = cursor.u8_named("config color mode")?;
            cursor.advance(2, "config screen pad")?;
            read = 52;
        }

        if size >= 56 {
            config.grammatical_inflection = cursor.u8_named("config grammatical inflection")?;
            cursor.advance(3, "config inflection pad")?;
            read = 56;
        }

        // Only bytes past the known layout are validated; a shorter remainder is padding.
        let exceeding = size.saturating_sub(KNOWN_CONFIG_BYTES) as usize;
        let padding = (size - read) as usize - exceeding;
        if padding > 0 {
            cursor.advance(padding, "config padding")?;
        }
        if exceeding > 0 {
            let extra = cursor.take_bytes(exceeding, "config exceeding bytes")?;
            let hex: String = extra.iter().rev().map(|b| format!("{b:02x}")).collect();
            if extra.iter().all(|&b| b == 0) {
                debug!("Config flags size > {KNOWN_CONFIG_BYTES}, but exceeding bytes are all zero.");
            } else {
                warn!(
                    "Config flags size > {KNOWN_CONFIG_BYTES}. Exceeding bytes: 0x{hex}. Marking config as invalid."
                );
                config.is_invalid = true;
            }
        }

        Ok(config)
    }

    pub fn is_default(&self) -> bool {
        *self == ConfigDescriptor::new()
    }

    /// Render the directory qualifier suffix, e.g. `-en-rUS-land-v21`. Empty for the default
    /// configuration.
    pub fn qualifiers(&self) -> String {
        let mut ret = String::new();

        if self.mcc != 0 {
            ret.push_str(&format!("-mcc{:03}", self.mcc));
            if self.mnc == MNC_ZERO {
                ret.push_str("-mnc00");
            } else if self.mnc != 0 {
                ret.push_str(&format!("-mnc{:02}", self.mnc));
            }
        }
        ret.push_str(&self.locale_qualifier());

        match self.grammatical_inflection {
            1 => ret.push_str("-neuter"),
            2 => ret.push_str("-feminine"),
            3 => ret.push_str("-masculine"),
            _ => {}
        }
        match self.screen_layout & MASK_LAYOUTDIR {
            0x40 => ret.push_str("-ldltr"),
            0x80 => ret.push_str("-ldrtl"),
            _ => {}
        }
        if self.smallest_screen_width_dp != 0 {
            ret.push_str(&format!("-sw{}dp", self.smallest_screen_width_dp));
        }
        if self.screen_width_dp != 0 {
            ret.push_str(&format!("-w{}dp", self.screen_width_dp));
        }
        if self.screen_height_dp != 0 {
            ret.push_str(&format!("-h{}dp", self.screen_height_dp));
        }
        match self.screen_layout & MASK_SCREENSIZE {
            1 => ret.push_str("-small"),
            2 => ret.push_str("-normal"),
            3 => ret.push_str("-large"),
            4 => ret.push_str("-xlarge"),
            _ => {}
        }
        match self.screen_layout & MASK_SCREENLONG {
            0x10 => ret.push_str("-notlong"),
            0x20 => ret.push_str("-long"),
            _ => {}
        }
        match self.screen_layout2 & MASK_SCREENROUND {
            1 => ret.push_str("-notround"),
            2 => ret.push_str("-round"),
            _ => {}
        }
        match self.color_mode & MASK_WIDE_COLOR_GAMUT {
            1 => ret.push_str("-nowidecg"),
            2 => ret.push_str("-widecg"),
            _ => {}
        }
        match self.color_mode & MASK_HDR {
            0x04 => ret.push_str("-lowdr"),
            0x08 => ret.push_str("-highdr"),
            _ => {}
        }
        match self.orientation {
            1 => ret.push_str("-port"),
            2 => ret.push_str("-land"),
            3 => ret.push_str("-square"),
            _ => {}
        }
        match self.ui_mode & MASK_UI_MODE_TYPE {
            2 => ret.push_str("-desk"),
            3 => ret.push_str("-car"),
            4 => ret.push_str("-television"),
            5 => ret.push_str("-appliance"),
            6 => ret.push_str("-watch"),
            7 => ret.push_str("-vrheadset"),
            _ => {}
        }
        match self.ui_mode & MASK_UI_MODE_NIGHT {
            0x10 => ret.push_str("-notnight"),
            0x20 => ret.push_str("-night"),
            _ => {}
        }
        match self.density {
            DENSITY_DEFAULT => {}
            DENSITY_LOW => ret.push_str("-ldpi"),
            DENSITY_MEDIUM => ret.push_str("-mdpi"),
            DENSITY_TV => ret.push_str("-tvdpi"),
            DENSITY_HIGH => ret.push_str("-hdpi"),
            DENSITY_XHIGH => ret.push_str("-xhdpi"),
            DENSITY_XXHIGH => ret.push_str("-xxhdpi"),
            DENSITY_XXXHIGH => ret.push_str("-xxxhdpi"),
            DENSITY_ANY => ret.push_str("-anydpi"),
            DENSITY_NONE => ret.push_str("-nodpi"),
            other => ret.push_str(&format!("-{other}dpi")),
        }
        match self.touchscreen {
            1 => ret.push_str("-notouch"),
            2 => ret.push_str("-stylus"),
            3 => ret.push_str("-finger"),
            _ => {}
        }
        match self.input_flags & MASK_KEYSHIDDEN {
            1 => ret.push_str("-keysexposed"),
            2 => ret.push_str("-keyshidden"),
            3 => ret.push_str("-keyssoft"),
            _ => {}
        }
        match self.keyboard {
            1 => ret.push_str("-nokeys"),
            2 => ret.push_str("-qwerty"),
            3 => ret.push_str("-12key"),
            _ => {}
        }
        match self.input_flags & MASK_NAVHIDDEN {
            0x04 => ret.push_str("-navexposed"),
            0x08 => ret.push_str("-navhidden"),
            _ => {}
        }
        match self.navigation {
            1 => ret.push_str("-nonav"),
            2 => ret.push_str("-dpad"),
            3 => ret.push_str("-trackball"),
            4 => ret.push_str("-wheel"),
            _ => {}
        }
        if self.screen_width != 0 && self.screen_height != 0 {
            let (w, h) = (self.screen_width, self.screen_height);
            ret.push_str(&format!("-{}x{}", w.max(h), w.min(h)));
        }
        if self.sdk_version > 0 {
            ret.push_str(&format!("-v{}", self.sdk_version));
        }
        if self.is_invalid {
            ret.push_str("-ERR");
        }

        ret
    }

    fn locale_qualifier(&self) -> String {
        if self.language.is_empty() && self.region.is_empty() {
            return String::new();
        }

        let bcp47 = !self.locale_script.is_empty()
            || !self.locale_variant.is_empty()
            || self.language.len() == 3
            || self.region.len() == 3;

        if bcp47 {
            let mut ret = format!("-b+{}", self.language);
            for part in [&self.locale_script, &self.region, &self.locale_variant] {
                if !part.is_empty() {
                    ret.push('+');
                    ret.push_str(part);
                }
            }
            ret
        } else if self.region.is_empty() {
            format!("-{}", self.language)
        } else {
            format!("-{}-r{}", self.language, self.region)
        }
    }

    #[allow(clippy::type_complexity)]
    fn identity(
        &self,
    ) -> (
        (i16, i16, &str, &str, u8, u8, u16, u8, u8, u8),
        (u16, u16, u16, u16, u8, u8, u16, u16, u16),
        (&str, &str, u8, u8, u8, bool),
    ) {
        (
            (
                self.mcc,
                self.mnc,
                &self.language,
                &self.region,
                self.orientation,
                self.touchscreen,
                self.density,
                self.keyboard,
                self.navigation,
                self.input_flags,
            ),
            (
                self.screen_width,
                self.screen_height,
                self.sdk_version,
                self.minor_version,
                self.screen_layout,
                self.ui_mode,
                self.smallest_screen_width_dp,
                self.screen_width_dp,
                self.screen_height_dp,
            ),
            (
                &self.locale_script,
                &self.locale_variant,
                self.screen_layout2,
                self.color_mode,
                self.grammatical_inflection,
                self.is_invalid,
            ),
        )
    }
}

impl PartialEq for ConfigDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ConfigDescriptor {}

impl Hash for ConfigDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for ConfigDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qualifiers = self.qualifiers();
        if qualifiers.is_empty() {
            write!(f, "[DEFAULT]")
        } else {
            write!(f, "{}", &qualifiers[1..])
        }
    }
}

/// Language and region codes are either two plain ASCII bytes or, for three letter codes,
/// three 5-bit values packed into 15 bits with the top bit set.
fn unpack_language_or_region(input: [u8; 2], base: u8) -> String {
    let [in0, in1] = input;
    if in0 & 0x80 != 0 {
        let first = in1 & 0x1F;
        let second = ((in1 & 0xE0) >> 5) + ((in0 & 0x03) << 3);
        let third = (in0 & 0x7C) >> 2;
        return [first, second, third]
            .iter()
            .map(|&c| (c + base) as char)
            .collect();
    }

    input
        .iter()
        .filter(|&&c| c != 0)
        .map(|&c| c as char)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Encode a descriptor of `size` bytes with the commonly used fields set.
    pub(crate) fn config_bytes(size: u32, language: &[u8; 2], region: &[u8; 2], sdk: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&size.to_le_bytes()); // size
        out.extend_from_slice(&0u16.to_le_bytes()); // mcc
        out.extend_from_slice(&0u16.to_le_bytes()); // mnc
        out.extend_from_slice(language);
        out.extend_from_slice(region);
        out.extend_from_slice(&[0, 0]); // orientation, touchscreen
        out.extend_from_slice(&0u16.to_le_bytes()); // density
        out.extend_from_slice(&[0, 0, 0, 0]); // keyboard, navigation, input flags, pad
        out.extend_from_slice(&0u16.to_le_bytes()); // screen width
        out.extend_from_slice(&0u16.to_le_bytes()); // screen height
        out.extend_from_slice(&sdk.to_le_bytes()); // sdk version
        out.extend_from_slice(&0u16.to_le_bytes()); // minor version
        out.resize(size as usize, 0);
        out
    }

    fn read(bytes: &[u8]) -> ConfigDescriptor {
        let mut cursor = ByteCursor::new(bytes);
        let config = ConfigDescriptor::read(&mut cursor).unwrap();
        assert_eq!(cursor.pos(), bytes.len());
        config
    }

    #[test]
    fn test_default_config() {
        let config = read(&config_bytes(64, &[0, 0], &[0, 0], 0));

        assert!(!config.is_invalid);
        assert!(config.is_default());
        assert_eq!(config.qualifiers(), "");
        assert_eq!(config.to_string(), "[DEFAULT]");
    }

    #[test]
    fn test_equal_fields_with_different_sizes_are_equal() {
        let small = read(&config_bytes(28, b"en", b"US", 0));
        let large = read(&config_bytes(56, b"en", b"US", 0));

        assert_eq!(small, large);
        assert_eq!(small.qualifiers(), "-en-rUS");
    }

    #[test]
    fn test_non_zero_trailing_bytes_mark_invalid() {
        let mut bytes = config_bytes(60, b"fr", &[0, 0], 21);
        bytes[58] = 0x01;
        let config = read(&bytes);

        assert!(config.is_invalid);
        assert_eq!(config.qualifiers(), "-fr-v21-ERR");
        assert_ne!(config, read(&config_bytes(60, b"fr", &[0, 0], 21)));
    }

    #[test]
    fn test_padding_below_known_size_is_not_validated() {
        let mut bytes = config_bytes(50, b"en", &[0, 0], 0);
        bytes[48] = 0x01;
        bytes[49] = 0x02;
        let config = read(&bytes);

        assert!(!config.is_invalid);
        assert_eq!(config, read(&config_bytes(50, b"en", &[0, 0], 0)));
        assert_eq!(config.qualifiers(), "-en");
    }

    #[test]
    fn test_grammatical_inflection_is_part_of_identity() {
        let mut bytes = config_bytes(56, b"de", &[0, 0], 0);
        bytes[52] = 2;
        let config = read(&bytes);

        assert_eq!(config.grammatical_inflection, 2);
        assert_eq!(config.qualifiers(), "-de-feminine");
        assert_ne!(config, read(&config_bytes(56, b"de", &[0, 0], 0)));
    }

    #[test]
    fn test_packed_three_letter_language() {
        // "fil" packed: f=5, i=8, l=11 relative to 'a'.
        let first = 5u8;
        let second = 8u8;
        let third = 11u8;
        let in0 = 0x80 | (third << 2) | (second >> 3);
        let in1 = ((second & 0x07) << 5) | first;
        let config = read(&config_bytes(28, &[in0, in1], b"PH", 0));

        assert_eq!(config.language, "fil");
        assert_eq!(config.qualifiers(), "-b+fil+PH");
    }

    #[test]
    fn test_extended_fields_render_in_order() {
        let mut bytes = config_bytes(52, b"en", &[0, 0], 0);
        bytes[12] = 2; // orientation: land
        bytes[16..18].copy_from_slice(&DENSITY_XHIGH.to_le_bytes());
        bytes[29] = 0x20; // ui mode: night
        bytes[30..32].copy_from_slice(&600u16.to_le_bytes()); // smallest width
        bytes[36..40].copy_from_slice(b"Latn");
        let config = read(&bytes);

        assert_eq!(config.locale_script, "Latn");
        assert_eq!(config.qualifiers(), "-b+en+Latn-sw600dp-land-night-xhdpi");
    }

    #[test]
    fn test_too_small_is_an_error() {
        let bytes = config_bytes(24, &[0, 0], &[0, 0], 0);
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            ConfigDescriptor::read(&mut cursor),
            Err(ArscError::ConfigTooSmall { size: 24, offset: 0 })
        ));
    }
}
