//! Accessor-generation macros for node payload enums
//!
//! These macros eliminate repetitive match code when working with `NodeData`.
//! They use `paste` internally for identifier concatenation.

/// Generate is_xxx, as_xxx, as_xxx_mut for enums with typed variants
///
/// Uses paste's `:camel` modifier to convert method name to variant name.
/// # Generated methods per variant:
/// - `is_xxx(&self) -> bool`
/// - `as_xxx(&self) -> Option<&Type>`
/// - `as_xxx_mut(&mut self) -> Option<&mut Type>`
///
/// # Example
/// ```ignore
/// impl NodeData {
///     // element -> Element, text -> Text, comment -> Comment
///     impl_enum_accessors!(element, text, comment);
/// }
/// ```
#[macro_export]
macro_rules! impl_enum_accessors {
    ($($variant:ident),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Check if this is a " [<$variant:camel>] " node"]
                #[inline]
                pub fn [<is_ $variant>](&self) -> bool {
                    matches!(self, Self::[<$variant:camel>](_))
                }

                #[doc = "Try to get as " $variant " reference"]
                #[inline]
                pub fn [<as_ $variant>](&self) -> Option<&[<$variant:camel>]> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }

                #[doc = "Try to get as mutable " $variant " reference"]
                #[inline]
                pub fn [<as_ $variant _mut>](&mut self) -> Option<&mut [<$variant:camel>]> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }
            )*
        }
    };
}

/// Generate a `kind()` method mapping each payload variant to a fieldless kind enum
///
/// Unit variants are listed after a `;`.
///
/// # Example
/// ```ignore
/// impl_kind_match!(NodeKind; Element, Text, Comment, Directive; Document);
/// ```
#[macro_export]
macro_rules! impl_kind_match {
    ($kind:ident; $($variant:ident),* ; $($unit:ident),* $(,)?) => {
        /// Fieldless discriminant of this node
        pub fn kind(&self) -> $kind {
            match self {
                $(Self::$variant(_) => $kind::$variant,)*
                $(Self::$unit => $kind::$unit,)*
            }
        }
    };
}
