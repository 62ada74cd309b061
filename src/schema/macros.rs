//! Declarative wiring of record types.

/// Implement [`Describe`](crate::schema::Describe),
/// [`Record`](crate::reflect::Record) and [`Reflect`](crate::reflect::Reflect)
/// for a plain struct.
///
/// Each entry names a struct field, optionally its wire name, and optionally
/// a block of UI annotations. Field accessors are generated as a static
/// `match` on the wire name, so no lookup tables exist at runtime.
///
/// ```
/// use config_admin::record;
///
/// #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
/// pub struct Listener {
///     pub host: String,
///     pub port: u16,
///     pub tls: bool,
///     pub token: String,
/// }
///
/// record!(Listener {
///     host as "Host" { required, label = "Bind host" },
///     port as "Port" { min = 1, max = 65535 },
///     tls as "TLS",
///     token { skip },
/// });
/// ```
///
/// Optional fields must be scalars (`Option<u16>`, `Option<String>`).
/// `Option<Record>` is not supported; use the record directly with a
/// default value, or a list of records:
///
/// ```compile_fail
/// use config_admin::record;
///
/// #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
/// pub struct Tls {
///     pub cert: String,
/// }
///
/// record!(Tls { cert as "Cert" });
///
/// #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
/// pub struct Listener {
///     pub tls: Option<Tls>,
/// }
///
/// record!(Listener { tls as "TLS" });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty {
        $(
            $field:ident $(as $name:literal)?
            $({ $($meta:ident $(= $val:expr)?),* $(,)? })?
        ),* $(,)?
    }) => {
        impl $crate::schema::Describe for $ty {
            fn shape() -> $crate::schema::Shape {
                $crate::schema::Shape::Record(vec![
                    $(
                        $crate::schema::FieldDescriptor::of(
                            $crate::__wire_name!($field $(, $name)?),
                            |value: &$ty| &value.$field,
                            $crate::schema::FieldMeta::new() $($( .$meta($($val)?) )*)?,
                        ),
                    )*
                ])
            }
        }

        impl $crate::reflect::Record for $ty {
            fn field(&self, name: &str) -> Option<&dyn $crate::reflect::Reflect> {
                $(
                    if name == $crate::__wire_name!($field $(, $name)?) {
                        return Some(&self.$field);
                    }
                )*
                None
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut dyn $crate::reflect::Reflect> {
                $(
                    if name == $crate::__wire_name!($field $(, $name)?) {
                        return Some(&mut self.$field);
                    }
                )*
                None
            }
        }

        impl $crate::reflect::Reflect for $ty {
            fn reflect_ref(&self) -> $crate::reflect::ReflectRef<'_> {
                $crate::reflect::ReflectRef::Record(self)
            }

            fn reflect_mut(&mut self) -> $crate::reflect::ReflectMut<'_> {
                $crate::reflect::ReflectMut::Record(self)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $name:literal) => {
        $name
    };
}
