//! The `model!` declaration macro

/// Declare a model struct and its [`Model`](crate::model::Model) impl
///
/// Fields marked `#[key]` form the primary key, in declaration order. All
/// fields become `pub`.
///
/// ```
/// use persista_core::model;
/// use persista_core::model::Model;
///
/// model! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct User {
///         #[key]
///         id: Option<i64>,
///         username: String,
///     }
/// }
///
/// let schema = User::schema();
/// assert_eq!(schema.name(), "user");
/// assert_eq!(schema.plural_name(), "users");
/// assert_eq!(schema.primary_key_names(), vec!["id"]);
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$attr:ident])? $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( pub $field: $ty, )*
        }

        impl $crate::model::Model for $name {
            fn schema() -> &'static $crate::model::ModelSchema {
                static SCHEMA: ::std::sync::OnceLock<$crate::model::ModelSchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::model::ModelSchema::builder(stringify!($name))
                        $(
                            .field(
                                stringify!($field),
                                <$ty as $crate::model::FieldValue>::FIELD_TYPE,
                                $crate::__model_field_is_key!($($attr)?),
                            )
                        )*
                        .build()
                })
            }

            fn values(&self) -> ::std::vec::Vec<$crate::model::Value> {
                ::std::vec![
                    $( $crate::model::FieldValue::to_value(&self.$field), )*
                ]
            }

            fn from_values(
                values: ::std::vec::Vec<$crate::model::Value>,
            ) -> $crate::errors::Result<Self> {
                let schema = <Self as $crate::model::Model>::schema();
                if values.len() != schema.fields().len() {
                    return Err($crate::errors::PersistError::DataFormatting {
                        path: schema.name().to_string(),
                        reason: format!(
                            "expected {} values, got {}",
                            schema.fields().len(),
                            values.len()
                        ),
                    });
                }
                #[allow(unused_mut, unused_variables)]
                let mut values = values.into_iter();
                Ok(Self {
                    $(
                        $field: $crate::model::FieldValue::from_value(
                            stringify!($field),
                            values.next().unwrap_or($crate::model::Value::Null),
                        )?,
                    )*
                })
            }

            fn set_value(
                &mut self,
                field: &str,
                value: $crate::model::Value,
            ) -> $crate::errors::Result<()> {
                match field {
                    $(
                        stringify!($field) => {
                            self.$field =
                                $crate::model::FieldValue::from_value(stringify!($field), value)?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::model::unknown_field(
                        <Self as $crate::model::Model>::schema(),
                        field,
                    )),
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __model_field_is_key {
    () => {
        false
    };
    (key) => {
        true
    };
}
