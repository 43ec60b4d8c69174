//! Serialization options, presets and the resolved configuration.
//!
//! [`FormOptions`] is a partial set of options; every field is optional and
//! options merge field by field. [`FormConfig::resolve`] merges options over
//! the defaults and validates the result before any traversal starts.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{FormError, Result};

/// Default bound on nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default delimiter for comma-joined arrays.
pub const DEFAULT_ARRAY_DELIMITER: &str = ",";

// ============================================================================
// Strategies
// ============================================================================

/// How array elements are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayStrategy {
    /// `key[]` for every element.
    BracketEmpty,
    /// `key[0]`, `key[1]`, ...
    BracketIndexed,
    /// `key` for every element.
    Repeat,
    /// One field with all elements joined by the delimiter.
    CommaJoined,
    Custom,
}

/// How object properties are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectStrategy {
    /// `key[prop]`
    Bracket,
    /// `key.prop`
    Dot,
    /// `key_prop`
    Underscore,
    Custom,
}

/// Child segment handed to a custom formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySegment<'a> {
    Index(usize),
    /// Property name, percent-encoded when `encode_keys` is on.
    Property(&'a str),
}

impl fmt::Display for KeySegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Index(i) => write!(f, "{i}"),
            KeySegment::Property(p) => f.write_str(p),
        }
    }
}

/// `(parent_key, child) -> field_name`
pub type KeyFormatter = Arc<dyn Fn(&str, KeySegment<'_>) -> String + Send + Sync>;

// ============================================================================
// FormOptions
// ============================================================================

/// Partial serialization options.
///
/// Formatters cannot come from a config file; set them in code.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormOptions {
    /// Preset applied underneath the other fields when loading from JSON.
    #[serde(default)]
    pub preset: Option<Preset>,
    pub array_strategy: Option<ArrayStrategy>,
    pub object_strategy: Option<ObjectStrategy>,
    #[serde(skip)]
    pub array_formatter: Option<KeyFormatter>,
    #[serde(skip)]
    pub object_formatter: Option<KeyFormatter>,
    pub max_depth: Option<usize>,
    pub encode_keys: Option<bool>,
    pub array_delimiter: Option<String>,
    pub comma_round_trip: Option<bool>,
}

impl FormOptions {
    pub fn preset(preset: Preset) -> Self {
        preset.options()
    }

    /// Parse options from a JSON config document.
    ///
    /// A `preset` field is expanded first; explicit fields override it.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut options: FormOptions = serde_json::from_str(json)
            .map_err(|e| FormError::InvalidConfiguration(e.to_string()))?;
        if let Some(preset) = options.preset.take() {
            options = preset.options().merge(options);
        }
        Ok(options)
    }

    /// Overlay `overrides` on `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: FormOptions) -> FormOptions {
        FormOptions {
            preset: overrides.preset.or(self.preset),
            array_strategy: overrides.array_strategy.or(self.array_strategy),
            object_strategy: overrides.object_strategy.or(self.object_strategy),
            array_formatter: overrides.array_formatter.or(self.array_formatter),
            object_formatter: overrides.object_formatter.or(self.object_formatter),
            max_depth: overrides.max_depth.or(self.max_depth),
            encode_keys: overrides.encode_keys.or(self.encode_keys),
            array_delimiter: overrides.array_delimiter.or(self.array_delimiter),
            comma_round_trip: overrides.comma_round_trip.or(self.comma_round_trip),
        }
    }

    /// Use a custom array formatter.
    pub fn with_array_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, KeySegment<'_>) -> String + Send + Sync + 'static,
    {
        self.array_strategy = Some(ArrayStrategy::Custom);
        self.array_formatter = Some(Arc::new(formatter));
        self
    }

    /// Use a custom object formatter.
    pub fn with_object_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, KeySegment<'_>) -> String + Send + Sync + 'static,
    {
        self.object_strategy = Some(ObjectStrategy::Custom);
        self.object_formatter = Some(Arc::new(formatter));
        self
    }
}

impl fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOptions")
            .field("preset", &self.preset)
            .field("array_strategy", &self.array_strategy)
            .field("object_strategy", &self.object_strategy)
            .field("array_formatter", &self.array_formatter.as_ref().map(|_| "<fn>"))
            .field("object_formatter", &self.object_formatter.as_ref().map(|_| "<fn>"))
            .field("max_depth", &self.max_depth)
            .field("encode_keys", &self.encode_keys)
            .field("array_delimiter", &self.array_delimiter)
            .field("comma_round_trip", &self.comma_round_trip)
            .finish()
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Ready-made option sets for common server conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// `tags[]=a&user[name]=b`
    Rails,
    /// `tags[0]=a&user[name]=b`
    Indexed,
    /// `tags[0]=a&user.name=b`
    Dot,
    /// `tags[0]=a&user_name=b`
    Underscore,
    /// `tags=a,b&user[name]=b`
    Comma,
    /// Like `Comma`, but single-element arrays keep a `[]` suffix.
    CommaRoundTrip,
    /// `tags=a&tags=b&user[name]=b`
    Repeat,
}

impl Preset {
    pub fn options(self) -> FormOptions {
        let (array, object) = match self {
            Preset::Rails => (ArrayStrategy::BracketEmpty, ObjectStrategy::Bracket),
            Preset::Indexed => (ArrayStrategy::BracketIndexed, ObjectStrategy::Bracket),
            Preset::Dot => (ArrayStrategy::BracketIndexed, ObjectStrategy::Dot),
            Preset::Underscore => (ArrayStrategy::BracketIndexed, ObjectStrategy::Underscore),
            Preset::Comma | Preset::CommaRoundTrip => {
                (ArrayStrategy::CommaJoined, ObjectStrategy::Bracket)
            }
            Preset::Repeat => (ArrayStrategy::Repeat, ObjectStrategy::Bracket),
        };
        FormOptions {
            array_strategy: Some(array),
            object_strategy: Some(object),
            comma_round_trip: (self == Preset::CommaRoundTrip).then_some(true),
            ..Default::default()
        }
    }
}

impl FromStr for Preset {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rails" => Ok(Preset::Rails),
            "indexed" => Ok(Preset::Indexed),
            "dot" => Ok(Preset::Dot),
            "underscore" => Ok(Preset::Underscore),
            "comma" => Ok(Preset::Comma),
            "comma-round-trip" => Ok(Preset::CommaRoundTrip),
            "repeat" => Ok(Preset::Repeat),
            other => Err(FormError::InvalidConfiguration(format!(
                "unknown preset \"{other}\""
            ))),
        }
    }
}

// ============================================================================
// FormConfig
// ============================================================================

/// Resolved array naming; a custom strategy always carries its formatter.
#[derive(Clone)]
pub enum ArrayFormat {
    BracketEmpty,
    BracketIndexed,
    Repeat,
    CommaJoined { delimiter: String, round_trip: bool },
    Custom(KeyFormatter),
}

/// Resolved object naming; a custom strategy always carries its formatter.
#[derive(Clone)]
pub enum ObjectFormat {
    Bracket,
    Dot,
    Underscore,
    Custom(KeyFormatter),
}

impl ArrayFormat {
    pub fn strategy(&self) -> ArrayStrategy {
        match self {
            ArrayFormat::BracketEmpty => ArrayStrategy::BracketEmpty,
            ArrayFormat::BracketIndexed => ArrayStrategy::BracketIndexed,
            ArrayFormat::Repeat => ArrayStrategy::Repeat,
            ArrayFormat::CommaJoined { .. } => ArrayStrategy::CommaJoined,
            ArrayFormat::Custom(_) => ArrayStrategy::Custom,
        }
    }
}

impl ObjectFormat {
    pub fn strategy(&self) -> ObjectStrategy {
        match self {
            ObjectFormat::Bracket => ObjectStrategy::Bracket,
            ObjectFormat::Dot => ObjectStrategy::Dot,
            ObjectFormat::Underscore => ObjectStrategy::Underscore,
            ObjectFormat::Custom(_) => ObjectStrategy::Custom,
        }
    }
}

impl fmt::Debug for ArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayFormat::CommaJoined {
                delimiter,
                round_trip,
            } => f
                .debug_struct("CommaJoined")
                .field("delimiter", delimiter)
                .field("round_trip", round_trip)
                .finish(),
            ArrayFormat::Custom(_) => f.write_str("Custom(<fn>)"),
            other => fmt::Debug::fmt(&other.strategy(), f),
        }
    }
}

impl fmt::Debug for ObjectFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectFormat::Custom(_) => f.write_str("Custom(<fn>)"),
            other => fmt::Debug::fmt(&other.strategy(), f),
        }
    }
}

/// Immutable, validated serialization configuration.
#[derive(Debug, Clone)]
pub struct FormConfig {
    array: ArrayFormat,
    object: ObjectFormat,
    max_depth: usize,
    encode_keys: bool,
}

impl FormConfig {
    /// Merge `options` over the defaults and validate.
    ///
    /// # Errors
    /// `InvalidConfiguration` if a custom strategy has no formatter or
    /// `max_depth` is zero.
    pub fn resolve(options: FormOptions) -> Result<Self> {
        let options = match options.preset {
            Some(preset) => preset.options().merge(options),
            None => options,
        };

        let max_depth = options.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if max_depth == 0 {
            return Err(FormError::InvalidConfiguration(
                "max_depth must be a positive integer".to_string(),
            ));
        }

        let array = match options.array_strategy.unwrap_or(ArrayStrategy::BracketEmpty) {
            ArrayStrategy::BracketEmpty => ArrayFormat::BracketEmpty,
            ArrayStrategy::BracketIndexed => ArrayFormat::BracketIndexed,
            ArrayStrategy::Repeat => ArrayFormat::Repeat,
            ArrayStrategy::CommaJoined => ArrayFormat::CommaJoined {
                delimiter: options
                    .array_delimiter
                    .unwrap_or_else(|| DEFAULT_ARRAY_DELIMITER.to_string()),
                round_trip: options.comma_round_trip.unwrap_or(false),
            },
            ArrayStrategy::Custom => ArrayFormat::Custom(options.array_formatter.ok_or_else(
                || {
                    FormError::InvalidConfiguration(
                        "array_strategy is custom but no array_formatter was given".to_string(),
                    )
                },
            )?),
        };

        let object = match options.object_strategy.unwrap_or(ObjectStrategy::Bracket) {
            ObjectStrategy::Bracket => ObjectFormat::Bracket,
            ObjectStrategy::Dot => ObjectFormat::Dot,
            ObjectStrategy::Underscore => ObjectFormat::Underscore,
            ObjectStrategy::Custom => ObjectFormat::Custom(options.object_formatter.ok_or_else(
                || {
                    FormError::InvalidConfiguration(
                        "object_strategy is custom but no object_formatter was given".to_string(),
                    )
                },
            )?),
        };

        Ok(FormConfig {
            array,
            object,
            max_depth,
            encode_keys: options.encode_keys.unwrap_or(false),
        })
    }

    pub fn array(&self) -> &ArrayFormat {
        &self.array
    }

    pub fn object(&self) -> &ObjectFormat {
        &self.object
    }

    pub fn array_strategy(&self) -> ArrayStrategy {
        self.array.strategy()
    }

    pub fn object_strategy(&self) -> ObjectStrategy {
        self.object.strategy()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn encode_keys(&self) -> bool {
        self.encode_keys
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            array: ArrayFormat::BracketEmpty,
            object: ObjectFormat::Bracket,
            max_depth: DEFAULT_MAX_DEPTH,
            encode_keys: false,
        }
    }
}
