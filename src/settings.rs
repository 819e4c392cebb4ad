//! Process-wide (here: per-[`crate::runtime::Runtime`]) mutable settings.
//!
//! The original kernel keeps a single global settings block mutated by
//! named commands. Per Design Notes §9 this becomes an explicit context
//! struct threaded through the evaluation API, with scoped mutators that
//! guarantee restoration on every exit path (panics included, via `Drop`).

/// Angle unit used by trigonometric functions and complex arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum AngleMode {
    /// Degrees, 360 per turn.
    Deg,
    /// Radians.
    Rad,
    /// Gradians, 400 per turn.
    Grad,
    /// Fractions of pi (the argument is stored and read as a multiple of pi).
    PiRadians,
}

impl Default for AngleMode {
    fn default() -> Self {
        AngleMode::Deg
    }
}

/// Numeric display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum DisplayMode {
    /// Standard: shortest representation that round-trips.
    Std,
    /// Fixed number of decimal places.
    Fix,
    /// Scientific notation.
    Sci,
    /// Engineering notation (exponent is a multiple of 3).
    Eng,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Std
    }
}

/// All persistent, session-wide settings named in the external interface
/// contract (§6). Every field has a typed accessor rather than stringly
/// typed access, following the VM's preference for named constants over
/// magic values (see its `consts.rs`).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    precision: u32,
    display_mode: DisplayMode,
    display_digits: u32,
    exponent_separator: char,
    decimal_separator: char,
    digit_group_separator: Option<char>,
    based_number_separator: Option<char>,
    base: u32,
    word_size: u32,
    angle_mode: AngleMode,
    auto_simplify: bool,
    zero_over_zero_undefined: bool,
    zero_pow_zero_undefined: bool,
    numerical_results: bool,
    small_fractions: bool,
    mixed_fractions: bool,
    hardware_floating_point: bool,
    maximum_rewrites: u32,
    solver_precision: u32,
    solver_iterations: u32,
    fraction_iterations: u32,
    fraction_digits: u32,
    maximum_decimal_exponent: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            precision: 20,
            display_mode: DisplayMode::Std,
            display_digits: 20,
            exponent_separator: 'e',
            decimal_separator: '.',
            digit_group_separator: None,
            based_number_separator: None,
            base: 10,
            word_size: 64,
            angle_mode: AngleMode::Deg,
            auto_simplify: true,
            zero_over_zero_undefined: true,
            zero_pow_zero_undefined: false,
            numerical_results: false,
            small_fractions: false,
            mixed_fractions: false,
            hardware_floating_point: true,
            maximum_rewrites: 100,
            solver_precision: 9,
            solver_iterations: 50,
            fraction_iterations: 20,
            fraction_digits: 12,
            maximum_decimal_exponent: 499,
        }
    }
}

macro_rules! setting_accessor {
    ($field:ident, $get:ident, $set:ident, $t:ty) => {
        /// Current value of this setting.
        pub fn $get(&self) -> $t {
            self.$field
        }
        /// Overwrite this setting.
        pub fn $set(&mut self, value: $t) {
            self.$field = value;
        }
    };
}

impl Settings {
    setting_accessor!(precision, precision, set_precision, u32);
    setting_accessor!(display_mode, display_mode, set_display_mode, DisplayMode);
    setting_accessor!(display_digits, display_digits, set_display_digits, u32);
    setting_accessor!(exponent_separator, exponent_separator, set_exponent_separator, char);
    setting_accessor!(decimal_separator, decimal_separator, set_decimal_separator, char);
    setting_accessor!(base, base, set_base, u32);
    setting_accessor!(word_size, word_size, set_word_size, u32);
    setting_accessor!(angle_mode, angle_mode, set_angle_mode, AngleMode);
    setting_accessor!(auto_simplify, auto_simplify, set_auto_simplify, bool);
    setting_accessor!(
        zero_over_zero_undefined,
        zero_over_zero_undefined,
        set_zero_over_zero_undefined,
        bool
    );
    setting_accessor!(
        zero_pow_zero_undefined,
        zero_pow_zero_undefined,
        set_zero_pow_zero_undefined,
        bool
    );
    setting_accessor!(numerical_results, numerical_results, set_numerical_results, bool);
    setting_accessor!(small_fractions, small_fractions, set_small_fractions, bool);
    setting_accessor!(mixed_fractions, mixed_fractions, set_mixed_fractions, bool);
    setting_accessor!(
        hardware_floating_point,
        hardware_floating_point,
        set_hardware_floating_point,
        bool
    );
    setting_accessor!(maximum_rewrites, maximum_rewrites, set_maximum_rewrites, u32);
    setting_accessor!(solver_precision, solver_precision, set_solver_precision, u32);
    setting_accessor!(solver_iterations, solver_iterations, set_solver_iterations, u32);
    setting_accessor!(fraction_iterations, fraction_iterations, set_fraction_iterations, u32);
    setting_accessor!(fraction_digits, fraction_digits, set_fraction_digits, u32);
    setting_accessor!(
        maximum_decimal_exponent,
        maximum_decimal_exponent,
        set_maximum_decimal_exponent,
        i32
    );

    /// The digit-group separator, if grouping is enabled.
    pub fn digit_group_separator(&self) -> Option<char> {
        self.digit_group_separator
    }

    /// Enable or disable (`None`) digit-group separators.
    pub fn set_digit_group_separator(&mut self, sep: Option<char>) {
        self.digit_group_separator = sep;
    }

    /// The separator used between the radix digits of a based number.
    pub fn based_number_separator(&self) -> Option<char> {
        self.based_number_separator
    }

    /// Enable or disable (`None`) based-number digit-group separators.
    pub fn set_based_number_separator(&mut self, sep: Option<char>) {
        self.based_number_separator = sep;
    }

    /// Whether the configured word size fits a native 64-bit fast path.
    pub fn native_word_size_fits(&self) -> bool {
        self.word_size <= 64
    }

    /// Mask a magnitude to the configured word size (`word_size` in
    /// `1..=64`; `64` is the identity mask).
    pub fn mask_to_word_size(&self, value: u64) -> u64 {
        if self.word_size >= 64 {
            value
        } else {
            value & ((1u64 << self.word_size) - 1)
        }
    }
}

/// A guard that restores the precision setting to its previous value on
/// drop, used to bump precision by a number of "guard digits" for the
/// duration of an intermediate computation (§4.E).
pub struct PrecisionGuard<'s> {
    settings: &'s mut Settings,
    previous: u32,
}

impl<'s> PrecisionGuard<'s> {
    /// Bump `settings`' precision by `guard_digits` and return a guard
    /// that restores it when dropped.
    pub fn bump(settings: &'s mut Settings, guard_digits: u32) -> Self {
        let previous = settings.precision();
        settings.set_precision(previous.saturating_add(guard_digits));
        PrecisionGuard { settings, previous }
    }
}

impl Drop for PrecisionGuard<'_> {
    fn drop(&mut self) {
        self.settings.set_precision(self.previous);
    }
}

/// A guard that restores the angle mode on drop. Used by the solver to
/// force radians during its inner evaluations without a lingering effect
/// on the caller's settings (§4.M: "disable ... angle-unit decoration").
pub struct AngleModeGuard<'s> {
    settings: &'s mut Settings,
    previous: AngleMode,
}

impl<'s> AngleModeGuard<'s> {
    /// Force `settings`' angle mode to `mode`, restoring the previous mode
    /// when the guard drops.
    pub fn force(settings: &'s mut Settings, mode: AngleMode) -> Self {
        let previous = settings.angle_mode();
        settings.set_angle_mode(mode);
        AngleModeGuard { settings, previous }
    }
}

impl Drop for AngleModeGuard<'_> {
    fn drop(&mut self) {
        self.settings.set_angle_mode(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_guard_restores_on_drop() {
        let mut settings = Settings::default();
        let original = settings.precision();
        {
            let _guard = PrecisionGuard::bump(&mut settings, 5);
        }
        assert_eq!(settings.precision(), original);
    }

    #[test]
    fn mask_to_word_size() {
        let mut s = Settings::default();
        s.set_word_size(8);
        assert_eq!(s.mask_to_word_size(0x1ff), 0xff);
        s.set_word_size(64);
        assert_eq!(s.mask_to_word_size(u64::MAX), u64::MAX);
    }
}
