use core::any::Any;

/// Introspection over an enum generated by [`type_erasure`].
///
/// Every generated `Any<Trait>` enum implements this trait. The payload
/// types are reported in the order they were listed in the attribute.
///
/// # Examples
///
/// ```rust
/// use type_erasure::{Erased, type_erasure};
///
/// #[type_erasure([Meters, Feet])]
/// pub trait Length {
///     fn meters(&self) -> f64;
/// }
///
/// pub struct Meters(f64);
/// pub struct Feet(f64);
///
/// impl Length for Meters {
///     fn meters(&self) -> f64 {
///         self.0
///     }
/// }
///
/// impl Length for Feet {
///     fn meters(&self) -> f64 {
///         self.0 * 0.3048
///     }
/// }
///
/// fn main() {
///     let mut length = AnyLength::from(Feet(10.0));
///     assert_eq!(AnyLength::TYPE_NAMES, ["Meters", "Feet"]);
///     assert_eq!(length.type_name(), "Feet");
///     assert!(length.is::<Feet>());
///
///     length.downcast_mut::<Feet>().unwrap().0 = 20.0;
///     assert!(length.downcast_ref::<Meters>().is_none());
///     assert!((length.meters() - 6.096).abs() < 1e-9);
/// }
/// ```
///
/// [`type_erasure`]: crate::type_erasure
pub trait Erased: Sized + 'static {
    /// The payload type names, in variant order.
    const TYPE_NAMES: &'static [&'static str];

    /// The position of the held variant in [`TYPE_NAMES`](Self::TYPE_NAMES).
    fn variant_index(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The number of variants.
    fn count() -> usize {
        Self::TYPE_NAMES.len()
    }

    /// The name of the held payload type.
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAMES[self.variant_index()]
    }

    fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}
