//! Folder-name qualifier tokens.
//!
//! A qualifier is one `-`-separated token in a resource folder name that
//! constrains the device configuration the folder applies to (`en`, `rUS`,
//! `hdpi`, `land`, `v21`, ...). Each qualifier belongs to exactly one
//! *dimension*, and dimensions have a fixed priority order used both when
//! validating folder names (tokens must appear in ascending dimension order)
//! and when resolving the best-matching candidate for a reference
//! configuration.
//!
//! The dimension order, highest priority first:
//! MCC > MNC > language > region > layout direction > smallest width >
//! screen size > screen aspect > round screen > wide color gamut > HDR >
//! orientation > UI mode > night mode > density > touchscreen >
//! keyboard state > keyboard > navigation state > navigation method >
//! screen dimensions > platform version.

use std::fmt;

/// Number of qualifier dimensions.
pub const DIMENSION_COUNT: usize = 22;

/// Dimension index of the language qualifier.
pub(crate) const DIM_LANGUAGE: usize = 2;

/// Layout direction qualifier values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    /// `ldltr` — left to right.
    Ltr,
    /// `ldrtl` — right to left.
    Rtl,
}

/// Screen size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScreenSize {
    /// `small`
    Small,
    /// `normal`
    Normal,
    /// `large`
    Large,
    /// `xlarge`
    Xlarge,
}

/// Screen aspect ratio bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenRatio {
    /// `long`
    Long,
    /// `notlong`
    NotLong,
}

/// Round screen qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenRound {
    /// `round`
    Round,
    /// `notround`
    NotRound,
}

/// Wide color gamut qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WideGamut {
    /// `widecg`
    Wide,
    /// `nowidecg`
    NoWide,
}

/// High dynamic range qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hdr {
    /// `highdr`
    High,
    /// `lowdr`
    Low,
}

/// Device orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// `port`
    Portrait,
    /// `land`
    Landscape,
    /// `square`
    Square,
}

/// UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiMode {
    /// `car`
    Car,
    /// `desk`
    Desk,
    /// `television`
    Television,
    /// `appliance`
    Appliance,
    /// `watch`
    Watch,
    /// `vrheadset`
    VrHeadset,
}

/// Night mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NightMode {
    /// `night`
    Night,
    /// `notnight`
    NotNight,
}

/// Pixel density bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Density {
    /// `ldpi`
    Low,
    /// `mdpi`
    Medium,
    /// `tvdpi`
    Tv,
    /// `hdpi`
    High,
    /// `xhdpi`
    XHigh,
    /// `xxhdpi`
    XxHigh,
    /// `xxxhdpi`
    XxxHigh,
    /// `nodpi`
    NoDpi,
    /// `anydpi`
    AnyDpi,
}

/// Touchscreen type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Touchscreen {
    /// `notouch`
    NoTouch,
    /// `stylus`
    Stylus,
    /// `finger`
    Finger,
}

/// Keyboard availability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardState {
    /// `keysexposed`
    Exposed,
    /// `keyshidden`
    Hidden,
    /// `keyssoft`
    Soft,
}

/// Primary text input method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyboard {
    /// `nokeys`
    NoKeys,
    /// `qwerty`
    Qwerty,
    /// `12key`
    TwelveKey,
}

/// Navigation key availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationState {
    /// `navexposed`
    Exposed,
    /// `navhidden`
    Hidden,
}

/// Primary non-touch navigation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Navigation {
    /// `nonav`
    NoNav,
    /// `dpad`
    Dpad,
    /// `trackball`
    Trackball,
    /// `wheel`
    Wheel,
}

/// One parsed qualifier token.
///
/// Variant order matches dimension priority order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// Mobile country code, e.g. `mcc310`.
    Mcc(u16),
    /// Mobile network code, e.g. `mnc004`.
    Mnc(u16),
    /// Two-letter ISO 639-1 language, e.g. `en`.
    Language(String),
    /// Region, e.g. `rUS` (stored without the `r` prefix).
    Region(String),
    /// Layout direction.
    LayoutDirection(LayoutDirection),
    /// Smallest width in dp, e.g. `sw600dp`.
    SmallestWidth(u16),
    /// Screen size bucket.
    ScreenSize(ScreenSize),
    /// Screen aspect ratio bucket.
    ScreenRatio(ScreenRatio),
    /// Round screen.
    ScreenRound(ScreenRound),
    /// Wide color gamut.
    WideGamut(WideGamut),
    /// High dynamic range.
    Hdr(Hdr),
    /// Orientation.
    Orientation(Orientation),
    /// UI mode.
    UiMode(UiMode),
    /// Night mode.
    NightMode(NightMode),
    /// Density bucket.
    Density(Density),
    /// Touchscreen type.
    Touchscreen(Touchscreen),
    /// Keyboard availability.
    KeyboardState(KeyboardState),
    /// Text input method.
    Keyboard(Keyboard),
    /// Navigation key availability.
    NavigationState(NavigationState),
    /// Navigation method.
    Navigation(Navigation),
    /// Legacy exact screen dimensions, e.g. `480x320` (larger dim first).
    ScreenDimensions(u32, u32),
    /// Minimum platform version, e.g. `v21`.
    Version(u16),
}

impl Qualifier {
    /// The dimension index of this qualifier (0 = highest priority).
    pub fn dimension(&self) -> usize {
        match self {
            Qualifier::Mcc(_) => 0,
            Qualifier::Mnc(_) => 1,
            Qualifier::Language(_) => 2,
            Qualifier::Region(_) => 3,
            Qualifier::LayoutDirection(_) => 4,
            Qualifier::SmallestWidth(_) => 5,
            Qualifier::ScreenSize(_) => 6,
            Qualifier::ScreenRatio(_) => 7,
            Qualifier::ScreenRound(_) => 8,
            Qualifier::WideGamut(_) => 9,
            Qualifier::Hdr(_) => 10,
            Qualifier::Orientation(_) => 11,
            Qualifier::UiMode(_) => 12,
            Qualifier::NightMode(_) => 13,
            Qualifier::Density(_) => 14,
            Qualifier::Touchscreen(_) => 15,
            Qualifier::KeyboardState(_) => 16,
            Qualifier::Keyboard(_) => 17,
            Qualifier::NavigationState(_) => 18,
            Qualifier::Navigation(_) => 19,
            Qualifier::ScreenDimensions(_, _) => 20,
            Qualifier::Version(_) => 21,
        }
    }

    /// Tries to parse a token as a qualifier of any dimension.
    ///
    /// Casing is normalized during parsing, so the resulting qualifier
    /// renders canonically regardless of the input casing.
    pub fn parse(token: &str) -> Option<Qualifier> {
        let lower = token.to_ascii_lowercase();

        if let Some(rest) = lower.strip_prefix("mcc") {
            return rest.parse().ok().map(Qualifier::Mcc);
        }
        if let Some(rest) = lower.strip_prefix("mnc") {
            return rest.parse().ok().map(Qualifier::Mnc);
        }
        // Region before language: both are short alpha tokens, but the
        // region form always carries the `r` prefix and two more letters.
        if token.len() == 3 {
            if let Some(rest) = token.strip_prefix(['r', 'R']) {
                if rest.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Some(Qualifier::Region(rest.to_ascii_uppercase()));
                }
            }
        }
        if lower.len() == 2 && lower.chars().all(|c| c.is_ascii_lowercase()) {
            return Some(Qualifier::Language(lower));
        }

        match lower.as_str() {
            "ldltr" => return Some(Qualifier::LayoutDirection(LayoutDirection::Ltr)),
            "ldrtl" => return Some(Qualifier::LayoutDirection(LayoutDirection::Rtl)),
            "small" => return Some(Qualifier::ScreenSize(ScreenSize::Small)),
            "normal" => return Some(Qualifier::ScreenSize(ScreenSize::Normal)),
            "large" => return Some(Qualifier::ScreenSize(ScreenSize::Large)),
            "xlarge" => return Some(Qualifier::ScreenSize(ScreenSize::Xlarge)),
            "long" => return Some(Qualifier::ScreenRatio(ScreenRatio::Long)),
            "notlong" => return Some(Qualifier::ScreenRatio(ScreenRatio::NotLong)),
            "round" => return Some(Qualifier::ScreenRound(ScreenRound::Round)),
            "notround" => return Some(Qualifier::ScreenRound(ScreenRound::NotRound)),
            "widecg" => return Some(Qualifier::WideGamut(WideGamut::Wide)),
            "nowidecg" => return Some(Qualifier::WideGamut(WideGamut::NoWide)),
            "highdr" => return Some(Qualifier::Hdr(Hdr::High)),
            "lowdr" => return Some(Qualifier::Hdr(Hdr::Low)),
            "port" => return Some(Qualifier::Orientation(Orientation::Portrait)),
            "land" => return Some(Qualifier::Orientation(Orientation::Landscape)),
            "square" => return Some(Qualifier::Orientation(Orientation::Square)),
            "car" => return Some(Qualifier::UiMode(UiMode::Car)),
            "desk" => return Some(Qualifier::UiMode(UiMode::Desk)),
            "television" => return Some(Qualifier::UiMode(UiMode::Television)),
            "appliance" => return Some(Qualifier::UiMode(UiMode::Appliance)),
            "watch" => return Some(Qualifier::UiMode(UiMode::Watch)),
            "vrheadset" => return Some(Qualifier::UiMode(UiMode::VrHeadset)),
            "night" => return Some(Qualifier::NightMode(NightMode::Night)),
            "notnight" => return Some(Qualifier::NightMode(NightMode::NotNight)),
            "ldpi" => return Some(Qualifier::Density(Density::Low)),
            "mdpi" => return Some(Qualifier::Density(Density::Medium)),
            "tvdpi" => return Some(Qualifier::Density(Density::Tv)),
            "hdpi" => return Some(Qualifier::Density(Density::High)),
            "xhdpi" => return Some(Qualifier::Density(Density::XHigh)),
            "xxhdpi" => return Some(Qualifier::Density(Density::XxHigh)),
            "xxxhdpi" => return Some(Qualifier::Density(Density::XxxHigh)),
            "nodpi" => return Some(Qualifier::Density(Density::NoDpi)),
            "anydpi" => return Some(Qualifier::Density(Density::AnyDpi)),
            "notouch" => return Some(Qualifier::Touchscreen(Touchscreen::NoTouch)),
            "stylus" => return Some(Qualifier::Touchscreen(Touchscreen::Stylus)),
            "finger" => return Some(Qualifier::Touchscreen(Touchscreen::Finger)),
            "keysexposed" => return Some(Qualifier::KeyboardState(KeyboardState::Exposed)),
            "keyshidden" => return Some(Qualifier::KeyboardState(KeyboardState::Hidden)),
            "keyssoft" => return Some(Qualifier::KeyboardState(KeyboardState::Soft)),
            "nokeys" => return Some(Qualifier::Keyboard(Keyboard::NoKeys)),
            "qwerty" => return Some(Qualifier::Keyboard(Keyboard::Qwerty)),
            "12key" => return Some(Qualifier::Keyboard(Keyboard::TwelveKey)),
            "navexposed" => return Some(Qualifier::NavigationState(NavigationState::Exposed)),
            "navhidden" => return Some(Qualifier::NavigationState(NavigationState::Hidden)),
            "nonav" => return Some(Qualifier::Navigation(Navigation::NoNav)),
            "dpad" => return Some(Qualifier::Navigation(Navigation::Dpad)),
            "trackball" => return Some(Qualifier::Navigation(Navigation::Trackball)),
            "wheel" => return Some(Qualifier::Navigation(Navigation::Wheel)),
            _ => {}
        }

        if let Some(rest) = lower.strip_prefix("sw") {
            if let Some(dp) = rest.strip_suffix("dp") {
                return dp.parse().ok().map(Qualifier::SmallestWidth);
            }
        }
        if let Some(rest) = lower.strip_prefix('v') {
            if let Ok(v) = rest.parse() {
                return Some(Qualifier::Version(v));
            }
        }
        if let Some((w, h)) = lower.split_once('x') {
            if let (Ok(w), Ok(h)) = (w.parse(), h.parse()) {
                return Some(Qualifier::ScreenDimensions(w, h));
            }
        }

        None
    }

    /// Whether this qualifier (from a candidate folder) is compatible with
    /// the same-dimension qualifier of a reference configuration.
    ///
    /// Most dimensions match on equality. Screen size matches when the
    /// candidate bucket is no larger than the reference, and version matches
    /// when the candidate requires no newer a platform than the reference
    /// provides.
    pub fn matches(&self, reference: &Qualifier) -> bool {
        match (self, reference) {
            (Qualifier::ScreenSize(c), Qualifier::ScreenSize(r)) => c <= r,
            (Qualifier::Version(c), Qualifier::Version(r)) => c <= r,
            (c, r) => c == r,
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Mcc(v) => write!(f, "mcc{v}"),
            Qualifier::Mnc(v) => write!(f, "mnc{v:03}"),
            Qualifier::Language(l) => f.write_str(l),
            Qualifier::Region(r) => write!(f, "r{r}"),
            Qualifier::LayoutDirection(LayoutDirection::Ltr) => f.write_str("ldltr"),
            Qualifier::LayoutDirection(LayoutDirection::Rtl) => f.write_str("ldrtl"),
            Qualifier::SmallestWidth(dp) => write!(f, "sw{dp}dp"),
            Qualifier::ScreenSize(ScreenSize::Small) => f.write_str("small"),
            Qualifier::ScreenSize(ScreenSize::Normal) => f.write_str("normal"),
            Qualifier::ScreenSize(ScreenSize::Large) => f.write_str("large"),
            Qualifier::ScreenSize(ScreenSize::Xlarge) => f.write_str("xlarge"),
            Qualifier::ScreenRatio(ScreenRatio::Long) => f.write_str("long"),
            Qualifier::ScreenRatio(ScreenRatio::NotLong) => f.write_str("notlong"),
            Qualifier::ScreenRound(ScreenRound::Round) => f.write_str("round"),
            Qualifier::ScreenRound(ScreenRound::NotRound) => f.write_str("notround"),
            Qualifier::WideGamut(WideGamut::Wide) => f.write_str("widecg"),
            Qualifier::WideGamut(WideGamut::NoWide) => f.write_str("nowidecg"),
            Qualifier::Hdr(Hdr::High) => f.write_str("highdr"),
            Qualifier::Hdr(Hdr::Low) => f.write_str("lowdr"),
            Qualifier::Orientation(Orientation::Portrait) => f.write_str("port"),
            Qualifier::Orientation(Orientation::Landscape) => f.write_str("land"),
            Qualifier::Orientation(Orientation::Square) => f.write_str("square"),
            Qualifier::UiMode(UiMode::Car) => f.write_str("car"),
            Qualifier::UiMode(UiMode::Desk) => f.write_str("desk"),
            Qualifier::UiMode(UiMode::Television) => f.write_str("television"),
            Qualifier::UiMode(UiMode::Appliance) => f.write_str("appliance"),
            Qualifier::UiMode(UiMode::Watch) => f.write_str("watch"),
            Qualifier::UiMode(UiMode::VrHeadset) => f.write_str("vrheadset"),
            Qualifier::NightMode(NightMode::Night) => f.write_str("night"),
            Qualifier::NightMode(NightMode::NotNight) => f.write_str("notnight"),
            Qualifier::Density(Density::Low) => f.write_str("ldpi"),
            Qualifier::Density(Density::Medium) => f.write_str("mdpi"),
            Qualifier::Density(Density::Tv) => f.write_str("tvdpi"),
            Qualifier::Density(Density::High) => f.write_str("hdpi"),
            Qualifier::Density(Density::XHigh) => f.write_str("xhdpi"),
            Qualifier::Density(Density::XxHigh) => f.write_str("xxhdpi"),
            Qualifier::Density(Density::XxxHigh) => f.write_str("xxxhdpi"),
            Qualifier::Density(Density::NoDpi) => f.write_str("nodpi"),
            Qualifier::Density(Density::AnyDpi) => f.write_str("anydpi"),
            Qualifier::Touchscreen(Touchscreen::NoTouch) => f.write_str("notouch"),
            Qualifier::Touchscreen(Touchscreen::Stylus) => f.write_str("stylus"),
            Qualifier::Touchscreen(Touchscreen::Finger) => f.write_str("finger"),
            Qualifier::KeyboardState(KeyboardState::Exposed) => f.write_str("keysexposed"),
            Qualifier::KeyboardState(KeyboardState::Hidden) => f.write_str("keyshidden"),
            Qualifier::KeyboardState(KeyboardState::Soft) => f.write_str("keyssoft"),
            Qualifier::Keyboard(Keyboard::NoKeys) => f.write_str("nokeys"),
            Qualifier::Keyboard(Keyboard::Qwerty) => f.write_str("qwerty"),
            Qualifier::Keyboard(Keyboard::TwelveKey) => f.write_str("12key"),
            Qualifier::NavigationState(NavigationState::Exposed) => f.write_str("navexposed"),
            Qualifier::NavigationState(NavigationState::Hidden) => f.write_str("navhidden"),
            Qualifier::Navigation(Navigation::NoNav) => f.write_str("nonav"),
            Qualifier::Navigation(Navigation::Dpad) => f.write_str("dpad"),
            Qualifier::Navigation(Navigation::Trackball) => f.write_str("trackball"),
            Qualifier::Navigation(Navigation::Wheel) => f.write_str("wheel"),
            Qualifier::ScreenDimensions(w, h) => write!(f, "{w}x{h}"),
            Qualifier::Version(v) => write!(f, "v{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale_tokens() {
        assert_eq!(Qualifier::parse("en"), Some(Qualifier::Language("en".into())));
        assert_eq!(Qualifier::parse("rUS"), Some(Qualifier::Region("US".into())));
        // Casing is normalized.
        assert_eq!(Qualifier::parse("EN"), Some(Qualifier::Language("en".into())));
        assert_eq!(Qualifier::parse("rus"), Some(Qualifier::Region("US".into())));
    }

    #[test]
    fn test_parse_numeric_tokens() {
        assert_eq!(Qualifier::parse("mcc310"), Some(Qualifier::Mcc(310)));
        assert_eq!(Qualifier::parse("mnc004"), Some(Qualifier::Mnc(4)));
        assert_eq!(Qualifier::parse("sw600dp"), Some(Qualifier::SmallestWidth(600)));
        assert_eq!(Qualifier::parse("v21"), Some(Qualifier::Version(21)));
        assert_eq!(
            Qualifier::parse("480x320"),
            Some(Qualifier::ScreenDimensions(480, 320))
        );
    }

    #[test]
    fn test_parse_named_tokens() {
        assert_eq!(
            Qualifier::parse("hdpi"),
            Some(Qualifier::Density(Density::High))
        );
        assert_eq!(
            Qualifier::parse("land"),
            Some(Qualifier::Orientation(Orientation::Landscape))
        );
        // `car` is a UI mode, never a language (languages are two letters).
        assert_eq!(Qualifier::parse("car"), Some(Qualifier::UiMode(UiMode::Car)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Qualifier::parse("xyz"), None);
        assert_eq!(Qualifier::parse("swdp"), None);
        assert_eq!(Qualifier::parse("v"), None);
        assert_eq!(Qualifier::parse(""), None);
    }

    #[test]
    fn test_dimension_order_is_strict() {
        let lang = Qualifier::parse("en").unwrap();
        let region = Qualifier::parse("rGB").unwrap();
        let density = Qualifier::parse("hdpi").unwrap();
        assert!(lang.dimension() < region.dimension());
        assert!(region.dimension() < density.dimension());
        assert!(density.dimension() < DIMENSION_COUNT);
    }

    #[test]
    fn test_version_matches_older_reference() {
        let cand = Qualifier::Version(19);
        let newer = Qualifier::Version(23);
        let older = Qualifier::Version(16);
        assert!(cand.matches(&newer));
        assert!(!cand.matches(&older));
    }

    #[test]
    fn test_screen_size_matches_smaller_bucket() {
        let normal = Qualifier::ScreenSize(ScreenSize::Normal);
        let large = Qualifier::ScreenSize(ScreenSize::Large);
        assert!(normal.matches(&large));
        assert!(!large.matches(&normal));
    }

    #[test]
    fn test_display_roundtrip() {
        for token in [
            "mcc310", "mnc004", "en", "rUS", "ldrtl", "sw600dp", "large", "notlong", "round",
            "widecg", "highdr", "port", "watch", "night", "xxhdpi", "finger", "keyssoft",
            "12key", "navhidden", "dpad", "480x320", "v21",
        ] {
            let q = Qualifier::parse(token)
                .unwrap_or_else(|| panic!("token {token} should parse"));
            assert_eq!(q.to_string(), token, "canonical form of {token}");
        }
    }
}
