//! Viewport-width breakpoints for choosing a column count.

use masonfeed_core::ConfigurationError;

/// A single `min_width -> columns` rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakpoint {
    /// Smallest viewport width (inclusive, logical pixels) the rule applies to.
    pub min_width: u32,
    /// Column count used from `min_width` upwards.
    pub columns: usize,
}

/// Mapping from viewport width to column count.
///
/// The active column count is the one of the largest `min_width` that is
/// `<=` the viewport width, or [`Breakpoints::default_columns`] when no rule
/// matches.
///
/// # Example
///
/// ```rust
/// use masonfeed_foundation::masonry::Breakpoints;
///
/// let breakpoints = Breakpoints::standard();
/// assert_eq!(breakpoints.columns_for_width(1280.0), 4);
/// assert_eq!(breakpoints.columns_for_width(640.0), 2);
/// assert_eq!(breakpoints.columns_for_width(320.0), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Breakpoints {
    default_columns: usize,
    rules: Vec<Breakpoint>,
}

impl Breakpoints {
    /// Creates a map with only a default column count.
    pub fn new(default_columns: usize) -> Self {
        Self {
            default_columns,
            rules: Vec::new(),
        }
    }

    /// A single column count regardless of width.
    pub fn fixed(columns: usize) -> Self {
        Self::new(columns)
    }

    /// Photo grid defaults: one column on phones, widening to four on
    /// desktop widths.
    pub fn standard() -> Self {
        Self::new(1)
            .with_breakpoint(500, 2)
            .with_breakpoint(700, 3)
            .with_breakpoint(1100, 4)
    }

    /// Builds a map from `(min_width, columns)` pairs, validating it.
    pub fn from_rules(
        default_columns: usize,
        rules: impl IntoIterator<Item = (u32, usize)>,
    ) -> Result<Self, ConfigurationError> {
        let breakpoints = rules
            .into_iter()
            .fold(Self::new(default_columns), |acc, (min_width, columns)| {
                acc.with_breakpoint(min_width, columns)
            });
        breakpoints.validate()?;
        Ok(breakpoints)
    }

    /// Adds a rule. Rules are kept sorted by descending `min_width`.
    pub fn with_breakpoint(mut self, min_width: u32, columns: usize) -> Self {
        let position = self
            .rules
            .iter()
            .position(|rule| rule.min_width < min_width)
            .unwrap_or(self.rules.len());
        self.rules.insert(position, Breakpoint { min_width, columns });
        self
    }

    pub fn default_columns(&self) -> usize {
        self.default_columns
    }

    /// Rules ordered from the widest threshold to the narrowest.
    pub fn rules(&self) -> &[Breakpoint] {
        &self.rules
    }

    /// Checks that every column count is at least one and that no threshold
    /// is declared twice.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.default_columns == 0 {
            return Err(ConfigurationError::ZeroColumns);
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.columns == 0 {
                return Err(ConfigurationError::ZeroColumnBreakpoint {
                    min_width: rule.min_width,
                });
            }
            // Sorted, so duplicates are adjacent.
            if i > 0 && self.rules[i - 1].min_width == rule.min_width {
                return Err(ConfigurationError::DuplicateBreakpoint {
                    min_width: rule.min_width,
                });
            }
        }
        Ok(())
    }

    /// Column count for a viewport of the given width.
    pub fn columns_for_width(&self, viewport_width: f32) -> usize {
        self.rules
            .iter()
            .find(|rule| rule.min_width as f32 <= viewport_width)
            .map(|rule| rule.columns)
            .unwrap_or(self.default_columns)
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::standard()
    }
}
