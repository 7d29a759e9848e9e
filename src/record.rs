use std::fmt;

/// Declares a struct type implementing the [`Record`] trait.
///
/// The macro generates the struct definition and the [`Record::names`] and
/// [`Record::values`] methods. Every field must implement [`Display`](std::fmt::Display).
/// The text rendering is left to a hand-written [`Display`](std::fmt::Display) impl,
/// since both tools print their own fixed line layout.
///
/// ```
/// use lltools::{Record, struct_record};
/// use std::fmt;
///
/// struct_record! {
///     pub struct Sample {
///         pub core: usize,
///         pub mhz: u32,
///     }
/// }
///
/// impl fmt::Display for Sample {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{} @ {} MHz", self.core, self.mhz)
///     }
/// }
///
/// assert_eq!(Sample::names(), &["core", "mhz"]);
/// ```
#[macro_export]
macro_rules! struct_record {
    ($(#[$meta:meta])* $vis:vis struct $Name:ident{
        $($fv:vis $f:ident:$F:ty,)* $(,)?
    }) => {
        $(#[$meta])*
        $vis struct $Name{
            $($fv $f:$F,)*
        }

        impl $crate::Record for $Name{
            fn names()->&'static [&'static str]{
                &[
                    $(std::stringify!($f),)*
                ]
            }

            fn values(&self,f:&mut dyn FnMut(&dyn std::fmt::Display)){
                $(f(&self.$f);)*
            }
        }
    };
}

/// One row of tool output.
///
/// The schema comes from [`names`](Self::names), the cells from
/// [`values`](Self::values), and the human-readable form from [`Display`](fmt::Display).
pub trait Record: fmt::Display {
    /// Returns the static list of field names in order.
    fn names() -> &'static [&'static str];
    /// Calls `f` for each field value, in the same order as [`names`](Self::names).
    fn values(&self, f: &mut dyn FnMut(&dyn fmt::Display));
}

/// Collects the values of `record` as strings.
pub(crate) fn value_strings<R: Record>(record: &R) -> Vec<String> {
    let mut out = Vec::with_capacity(R::names().len());
    record.values(&mut |v| out.push(v.to_string()));
    out
}
