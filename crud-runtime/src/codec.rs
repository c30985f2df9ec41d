//! Enum storage codec
//!
//! Proto enums travel as integers but are stored as lower-case strings. Each
//! generated entity carries one [`EnumCodec`] per enum field holding the fixed
//! variant table; reads are lenient and map unknown strings to the default
//! variant instead of failing the row.

/// Bijection between proto enum numbers and their storage strings
#[derive(Debug, Clone, Copy)]
pub struct EnumCodec {
    name: &'static str,
    variants: &'static [(i32, &'static str)],
}

impl EnumCodec {
    /// Build a codec; the first variant is the default
    pub const fn new(name: &'static str, variants: &'static [(i32, &'static str)]) -> Self {
        assert!(!variants.is_empty(), "enum codec needs at least one variant");
        Self { name, variants }
    }

    /// Enum type name, for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of the default variant
    pub fn default_value(&self) -> i32 {
        self.variants[0].0
    }

    /// Storage string of the default variant
    pub fn default_storage(&self) -> &'static str {
        self.variants[0].1
    }

    /// Storage string for a wire value; unknown numbers encode as the default
    pub fn encode(&self, value: i32) -> &'static str {
        self.variants
            .iter()
            .find(|(number, _)| *number == value)
            .map_or_else(|| self.default_storage(), |(_, storage)| *storage)
    }

    /// Wire value for a storage string; unknown strings decode as the default
    pub fn decode(&self, storage: &str) -> i32 {
        match self.variants.iter().find(|(_, s)| *s == storage) {
            Some((number, _)) => *number,
            None => {
                tracing::warn!(
                    enum_type = self.name,
                    value = storage,
                    "unknown stored enum value, using default"
                );
                self.default_value()
            }
        }
    }

    /// Encode an optional wire value, treating absence as the default
    pub fn encode_or_default(&self, value: Option<i32>) -> &'static str {
        value.map_or_else(|| self.default_storage(), |v| self.encode(v))
    }
}
