//! Render parameter fields and their validation
//!
//! Each numeric field is validated the way a browser validates an
//! `<input type="number">`: the raw text has to be a finite number and it has
//! to satisfy the field's own `required`/`min`/`max`/`step` constraints.

use serde::{Deserialize, Serialize};

/// One of the four numeric render parameters
///
/// Variants are declared in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    ImageWidth,
    ImageHeight,
    SamplesPerPixel,
    MaxBounces,
}

impl ParamField {
    /// All fields, in the order they are validated
    pub const ALL: [ParamField; 4] = [
        ParamField::ImageWidth,
        ParamField::ImageHeight,
        ParamField::SamplesPerPixel,
        ParamField::MaxBounces,
    ];

    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            ParamField::ImageWidth => "Image width",
            ParamField::ImageHeight => "Image height",
            ParamField::SamplesPerPixel => "Samples Per Pixel",
            ParamField::MaxBounces => "Max Reflection Bounces",
        }
    }

    /// Smallest value the renderer accepts, regardless of configured constraints
    fn floor(&self) -> u32 {
        match self {
            ParamField::MaxBounces => 0,
            _ => 1,
        }
    }
}

/// Native constraint check of a number field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// An empty value is rejected
    pub required: bool,
    /// Inclusive lower bound
    pub min: Option<f64>,
    /// Inclusive upper bound
    pub max: Option<f64>,
    /// Allowed increment, counted from `min` (or 0). `None` accepts any value.
    pub step: Option<f64>,
}

impl Default for FieldConstraints {
    fn default() -> Self {
        Self {
            required: true,
            min: None,
            max: None,
            step: Some(1.0),
        }
    }
}

impl FieldConstraints {
    /// Required integer field within `[min, max]`
    pub fn integer(min: u32, max: u32) -> Self {
        Self {
            required: true,
            min: Some(min as f64),
            max: Some(max as f64),
            step: Some(1.0),
        }
    }

    /// Check an already-parsed value against the range and step constraints
    pub fn check(&self, value: f64) -> Result<(), Violation> {
        if let Some(min) = self.min
            && value < min
        {
            return Err(Violation::BelowMin(min));
        }
        if let Some(max) = self.max
            && value > max
        {
            return Err(Violation::AboveMax(max));
        }
        if let Some(step) = self.step
            && step > 0.0
        {
            let base = self.min.unwrap_or(0.0);
            let steps = (value - base) / step;
            if (steps - steps.round()).abs() > STEP_EPSILON {
                return Err(Violation::StepMismatch(step));
            }
        }
        Ok(())
    }
}

const STEP_EPSILON: f64 = 1e-9;

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("value is missing")]
    Missing,

    #[error("value is not a number")]
    NotANumber,

    #[error("value is below the minimum of {0}")]
    BelowMin(f64),

    #[error("value is above the maximum of {0}")]
    AboveMax(f64),

    #[error("value does not match the step of {0}")]
    StepMismatch(f64),

    #[error("value cannot be passed to the renderer")]
    OutOfDomain,
}

/// A parameter field failed validation
///
/// Displays as the field's user-facing message, e.g. `Image width is invalid!`.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("{} is invalid!", .field.label())]
pub struct ValidationError {
    pub field: ParamField,
    pub violation: Violation,
}

/// Raw text of one field together with its constraints
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    pub raw: String,
    pub constraints: FieldConstraints,
}

impl FieldInput {
    pub fn new(raw: impl Into<String>, constraints: FieldConstraints) -> Self {
        Self {
            raw: raw.into(),
            constraints,
        }
    }

    /// Parse and check the raw text, as the renderer's unsigned argument
    pub fn check(&self, field: ParamField) -> Result<u32, ValidationError> {
        self.check_value(field)
            .map_err(|violation| ValidationError { field, violation })
    }

    fn check_value(&self, field: ParamField) -> Result<u32, Violation> {
        let raw = self.raw.as_str();
        if raw.trim().is_empty() {
            return Err(if self.constraints.required {
                Violation::Missing
            } else {
                Violation::NotANumber
            });
        }

        if !is_number_literal(raw) {
            return Err(Violation::NotANumber);
        }
        let value: f64 = raw.parse().map_err(|_| Violation::NotANumber)?;
        if !value.is_finite() {
            return Err(Violation::NotANumber);
        }

        self.constraints.check(value)?;

        if value.fract() != 0.0 || value < field.floor() as f64 || value > u32::MAX as f64 {
            return Err(Violation::OutOfDomain);
        }
        Ok(value as u32)
    }
}

/// Whether `text` is a floating-point number in the grammar number inputs accept
///
/// `-`? then digits, `.digits` or `digits.digits`, then an optional exponent.
/// No leading `+`, no trailing `.`, no surrounding whitespace.
fn is_number_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let digits = |i: &mut usize| {
        let start = *i;
        while bytes.get(*i).is_some_and(u8::is_ascii_digit) {
            *i += 1;
        }
        *i - start
    };

    let mut i = 0;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    let integral = digits(&mut i);
    let mut fraction = 0;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        fraction = digits(&mut i);
        if fraction == 0 {
            return false;
        }
    }
    if integral == 0 && fraction == 0 {
        return false;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}

/// Validated numeric render parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_bounces: u32,
}

/// Validate the four render parameters
///
/// Fields are read through `read` in the fixed order width, height,
/// samples per pixel, max bounces. The first failing field ends validation;
/// later fields are never read.
pub fn validate<F>(mut read: F) -> Result<RenderParams, ValidationError>
where
    F: FnMut(ParamField) -> FieldInput,
{
    let mut next = |field: ParamField| read(field).check(field);

    Ok(RenderParams {
        width: next(ParamField::ImageWidth)?,
        height: next(ParamField::ImageHeight)?,
        samples_per_pixel: next(ParamField::SamplesPerPixel)?,
        max_bounces: next(ParamField::MaxBounces)?,
    })
}
