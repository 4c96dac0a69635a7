//! Resource type taxonomy.
//!
//! Two related enums describe what a resource *is* and where it *lives*:
//!
//! - [`ResourceType`] — the logical type of a single resource item
//!   (`string`, `drawable`, `id`, ...). Values files can define many of
//!   these; file-based resources define exactly one.
//! - [`ResourceFolderType`] — the kind of folder a file was found in
//!   (`values`, `drawable-hdpi`, `layout-land`, ...). Every folder type
//!   except `values` maps to exactly one [`ResourceType`] via
//!   [`ResourceFolderType::related_resource_type`].

use std::fmt;

/// Logical type of a resource item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    /// Tween animation.
    Anim,
    /// Property animation.
    Animator,
    /// Array (`array`, `string-array`, `integer-array`).
    Array,
    /// Styleable attribute.
    Attr,
    /// Boolean value.
    Bool,
    /// Color value or state list.
    Color,
    /// Dimension value.
    Dimen,
    /// Drawable file or value.
    Drawable,
    /// Font file.
    Font,
    /// Fraction value.
    Fraction,
    /// Generated or declared identifier.
    Id,
    /// Integer value.
    Integer,
    /// Animation interpolator.
    Interpolator,
    /// Layout file.
    Layout,
    /// Menu file.
    Menu,
    /// Mipmap drawable.
    Mipmap,
    /// Quantity strings.
    Plurals,
    /// Public resource declaration.
    Public,
    /// Raw opaque file.
    Raw,
    /// String value.
    String,
    /// Style definition.
    Style,
    /// Declared styleable.
    Styleable,
    /// Scene transition.
    Transition,
    /// Arbitrary XML file.
    Xml,
}

impl ResourceType {
    /// Canonical tag / folder-prefix name for this type.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Anim => "anim",
            ResourceType::Animator => "animator",
            ResourceType::Array => "array",
            ResourceType::Attr => "attr",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Plurals => "plurals",
            ResourceType::Public => "public",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Style => "style",
            ResourceType::Styleable => "declare-styleable",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml",
        }
    }

    /// Parses a values-file tag name (or `type` attribute value) into a type.
    ///
    /// Unknown tags return `None`; the values parser treats those as
    /// forward-compatible and skips them silently.
    pub fn from_tag(tag: &str) -> Option<ResourceType> {
        let ty = match tag {
            "anim" => ResourceType::Anim,
            "animator" => ResourceType::Animator,
            "array" | "string-array" | "integer-array" => ResourceType::Array,
            "attr" => ResourceType::Attr,
            "bool" => ResourceType::Bool,
            "color" => ResourceType::Color,
            "dimen" => ResourceType::Dimen,
            "drawable" => ResourceType::Drawable,
            "font" => ResourceType::Font,
            "fraction" => ResourceType::Fraction,
            "id" => ResourceType::Id,
            "integer" => ResourceType::Integer,
            "interpolator" => ResourceType::Interpolator,
            "layout" => ResourceType::Layout,
            "menu" => ResourceType::Menu,
            "mipmap" => ResourceType::Mipmap,
            "plurals" => ResourceType::Plurals,
            "public" => ResourceType::Public,
            "raw" => ResourceType::Raw,
            "string" => ResourceType::String,
            "style" => ResourceType::Style,
            "declare-styleable" => ResourceType::Styleable,
            "transition" => ResourceType::Transition,
            "xml" => ResourceType::Xml,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of resource folder under a source root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFolderType {
    /// `anim/` — tween animations.
    Anim,
    /// `animator/` — property animations.
    Animator,
    /// `color/` — color state lists.
    Color,
    /// `drawable/` — drawables.
    Drawable,
    /// `font/` — fonts.
    Font,
    /// `interpolator/` — interpolators.
    Interpolator,
    /// `layout/` — layouts.
    Layout,
    /// `menu/` — menus.
    Menu,
    /// `mipmap/` — mipmaps.
    Mipmap,
    /// `raw/` — raw files.
    Raw,
    /// `transition/` — transitions.
    Transition,
    /// `values/` — multi-item values XML files.
    Values,
    /// `xml/` — arbitrary XML files.
    Xml,
}

impl ResourceFolderType {
    /// Canonical folder name prefix.
    pub fn name(self) -> &'static str {
        match self {
            ResourceFolderType::Anim => "anim",
            ResourceFolderType::Animator => "animator",
            ResourceFolderType::Color => "color",
            ResourceFolderType::Drawable => "drawable",
            ResourceFolderType::Font => "font",
            ResourceFolderType::Interpolator => "interpolator",
            ResourceFolderType::Layout => "layout",
            ResourceFolderType::Menu => "menu",
            ResourceFolderType::Mipmap => "mipmap",
            ResourceFolderType::Raw => "raw",
            ResourceFolderType::Transition => "transition",
            ResourceFolderType::Values => "values",
            ResourceFolderType::Xml => "xml",
        }
    }

    /// Parses a folder name prefix, case-insensitively.
    pub fn from_name(name: &str) -> Option<ResourceFolderType> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "anim" => ResourceFolderType::Anim,
            "animator" => ResourceFolderType::Animator,
            "color" => ResourceFolderType::Color,
            "drawable" => ResourceFolderType::Drawable,
            "font" => ResourceFolderType::Font,
            "interpolator" => ResourceFolderType::Interpolator,
            "layout" => ResourceFolderType::Layout,
            "menu" => ResourceFolderType::Menu,
            "mipmap" => ResourceFolderType::Mipmap,
            "raw" => ResourceFolderType::Raw,
            "transition" => ResourceFolderType::Transition,
            "values" => ResourceFolderType::Values,
            "xml" => ResourceFolderType::Xml,
            _ => return None,
        };
        Some(ty)
    }

    /// The single resource type produced by files in this folder.
    ///
    /// `values/` folders have no single type (each file inside defines many)
    /// and return `None`.
    pub fn related_resource_type(self) -> Option<ResourceType> {
        let ty = match self {
            ResourceFolderType::Anim => ResourceType::Anim,
            ResourceFolderType::Animator => ResourceType::Animator,
            ResourceFolderType::Color => ResourceType::Color,
            ResourceFolderType::Drawable => ResourceType::Drawable,
            ResourceFolderType::Font => ResourceType::Font,
            ResourceFolderType::Interpolator => ResourceType::Interpolator,
            ResourceFolderType::Layout => ResourceType::Layout,
            ResourceFolderType::Menu => ResourceType::Menu,
            ResourceFolderType::Mipmap => ResourceType::Mipmap,
            ResourceFolderType::Raw => ResourceType::Raw,
            ResourceFolderType::Transition => ResourceType::Transition,
            ResourceFolderType::Values => return None,
            ResourceFolderType::Xml => ResourceType::Xml,
        };
        Some(ty)
    }

    /// Whether XML files in this folder can declare implicit `@+id/` items.
    pub fn is_id_generating(self) -> bool {
        matches!(self, ResourceFolderType::Layout | ResourceFolderType::Menu)
    }
}

impl fmt::Display for ResourceFolderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
