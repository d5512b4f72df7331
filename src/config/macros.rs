/// Define a configuration struct with embedded defaults
///
/// Each field carries its type and default value in one place. The macro
/// generates the struct with public fields, a `Default` impl built from those
/// values, and serde support where missing keys fall back to the defaults.
///
/// # Example
/// ```
/// wallet_activity::config_struct! {
///     pub struct PagingConfig {
///         page_limit: usize = 60,
///         prefetch_second_page: bool = true,
///     }
/// }
///
/// let cfg: PagingConfig = toml::from_str("page_limit = 30").unwrap();
/// assert_eq!(cfg.page_limit, 30);
/// assert!(cfg.prefetch_second_page);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
