//! Device configuration qualifiers and folder configurations.
//!
//! Resource folders encode device constraints in their names
//! (`values-en-rUS`, `drawable-hdpi`). This module parses those names into
//! typed configurations and implements the best-match resolution used when
//! one resource name has candidates under several configurations.

mod folder;
mod qualifier;

pub use folder::{find_matching_configurable, Configurable, FolderConfiguration};
pub use qualifier::{
    Density, Hdr, Keyboard, KeyboardState, LayoutDirection, Navigation, NavigationState,
    NightMode, Orientation, Qualifier, ScreenRatio, ScreenRound, ScreenSize, Touchscreen, UiMode,
    WideGamut, DIMENSION_COUNT,
};
