//! Default configurations and presets for poldiff.
//!
//! Presets are named category selections for common review tasks.

use super::types::{AppConfig, DiffSettings};
use crate::diff::{Category, CategoryMask};

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigPreset {
    /// Every category
    All,
    /// Type enforcement: types, attributes, AV and TE rules
    Te,
    /// Role-based access control: roles, users and role rules
    Rbac,
    /// Multi-level security: levels, categories, users and range transitions
    Mls,
    /// Symbol declarations only, no rules
    Symbols,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Te => "te",
            Self::Rbac => "rbac",
            Self::Mls => "mls",
            Self::Symbols => "symbols",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "all" | "default" => Some(Self::All),
            "te" | "type-enforcement" => Some(Self::Te),
            "rbac" | "roles" => Some(Self::Rbac),
            "mls" => Some(Self::Mls),
            "symbols" | "declarations" => Some(Self::Symbols),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::All => "Compare every symbol and rule category",
            Self::Te => "Types, attributes, access vector rules and type rules",
            Self::Rbac => "Roles, users, role allow rules and role transitions",
            Self::Mls => "Sensitivities, categories, users and range transitions",
            Self::Symbols => "Symbol declarations without any rules",
        }
    }

    /// The categories this preset selects.
    #[must_use]
    pub const fn mask(&self) -> CategoryMask {
        match self {
            Self::All => CategoryMask::ALL,
            Self::Te => CategoryMask::from_bits_retain(
                CategoryMask::TYPES.bits()
                    | CategoryMask::ATTRIBS.bits()
                    | CategoryMask::AVRULES.bits()
                    | CategoryMask::TERULES.bits(),
            ),
            Self::Rbac => CategoryMask::from_bits_retain(
                CategoryMask::RBAC.bits() | CategoryMask::USERS.bits(),
            ),
            Self::Mls => CategoryMask::from_bits_retain(
                CategoryMask::MLS.bits() | CategoryMask::USERS.bits(),
            ),
            Self::Symbols => CategoryMask::SYMBOLS,
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::All, Self::Te, Self::Rbac, Self::Mls, Self::Symbols]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        let categories: Vec<Category> = match preset {
            ConfigPreset::All => Vec::new(),
            other => other.mask().categories().collect(),
        };
        Self {
            diff: DiffSettings {
                categories,
                line_numbers: false,
            },
            ..Self::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
