pub use chartcfg_catalog::{
    Bound, Catalog, CatalogError, DefaultSetting, Scope, ScopeKey, SettingType, normalize_name,
};
