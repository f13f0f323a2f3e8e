// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`string_enum!`]: `as_str`, `Display` and `FromStr` for unit enums
//! - [`setters!`]: setter methods for production builder/config structs

/// Generate `as_str`, `Display` and `FromStr` for a unit-only enum.
///
/// The first string of each arm is the canonical spelling; any further
/// strings are accepted as aliases when parsing. Parsing is case-insensitive.
///
/// ```ignore
/// crate::string_enum! {
///     Arch {
///         Amd64 => "amd64" | "x86_64",
///         Arm64 => "arm64" | "aarch64",
///     }
/// }
/// ```
#[macro_export]
macro_rules! string_enum {
    ($enum:ident { $( $variant:ident => $str:literal $(| $alias:literal)* ),+ $(,)? }) => {
        impl $enum {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum {
            type Err = $crate::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                match lower.as_str() {
                    $( $str $(| $alias)* => Ok(Self::$variant), )+
                    _ => Err($crate::ParseEnumError {
                        kind: stringify!($enum),
                        value: s.to_string(),
                        expected: &[$( $str ),+],
                    }),
                }
            }
        }
    };
}

/// Generate setter methods inside an existing `impl` block.
///
/// - `into { field: Type }`: setter uses `impl Into<Type>`
/// - `set { field: Type }`: setter takes `Type` directly
/// - `option { field: Type }`: field is `Option<Type>`, setter wraps in `Some(v.into())`
///
/// ```ignore
/// impl MyConfig {
///     mirage_core::setters! {
///         into { name: String }
///         set { count: u32 }
///         option { label: String }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(into {
            $( $into_field:ident : $into_ty:ty ),* $(,)?
        })?
        $(set {
            $( $set_field:ident : $set_ty:ty ),* $(,)?
        })?
        $(option {
            $( $opt_field:ident : $opt_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                self.$into_field = v.into();
                self
            }
        )*)?

        $($(
            pub fn $set_field(mut self, v: $set_ty) -> Self {
                self.$set_field = v;
                self
            }
        )*)?

        $($(
            pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(v.into());
                self
            }
        )*)?
    };
}
