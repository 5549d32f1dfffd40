//! 默认实现查找器
//!
//! 按命名约定为接口寻找默认实现类。接口名必须以 `Interface` 结尾，
//! 对 `app::mail::TransportInterface` 依次尝试：
//!
//! - `app::mail::DefaultTransport`
//! - `app::mail::DefaultTransportImpl`
//! - `app::mail::NullTransport`
//!
//! 第一个存在并且实现了该接口的类胜出。查找器本身不缓存结果。

use std::sync::Arc;

use crate::reflect::{TypeName, TypeReflector};

/// 接口名称必须带有的后缀
pub const INTERFACE_SUFFIX: &str = "Interface";

/// 候选类名的前缀与后缀，按顺序尝试
pub const CANDIDATE_AFFIXES: [(&str, &str); 3] = [("Default", ""), ("Default", "Impl"), ("Null", "")];

/// 默认实现查找器
#[derive(Clone)]
pub struct DefaultImplementationFinder {
    reflector: Arc<dyn TypeReflector>,
}

impl DefaultImplementationFinder {
    pub fn new(reflector: Arc<dyn TypeReflector>) -> Self {
        Self { reflector }
    }

    /// 查找接口的默认实现类，找不到时返回 `None`
    pub fn find_implementation(&self, interface: impl Into<TypeName>) -> Option<TypeName> {
        let interface = interface.into();
        if !interface.ends_with(INTERFACE_SUFFIX) {
            tracing::debug!("Interface name \"{}\" violates convention, \"Interface\" postfix missing", interface);
            return None;
        }

        let interface = interface.normalized();
        let (namespace, identifier) = interface.split_namespace();
        if namespace.is_empty() {
            tracing::debug!("Interface is \"{}\" without namespace", identifier);
        } else {
            tracing::debug!("Interface is \"{}\" in namespace \"{}\"", identifier, namespace);
        }

        let basename = &identifier[..identifier.len() - INTERFACE_SUFFIX.len()];
        tracing::debug!("Using basename \"{}\"", basename);

        for (prefix, postfix) in CANDIDATE_AFFIXES {
            let candidate = TypeName::new(format!("{namespace}{prefix}{basename}{postfix}"));
            tracing::debug!("Checking class \"{}\"", candidate);

            if !self.reflector.class_exists(&candidate) {
                tracing::debug!("Class \"{}\" does not exist", candidate);
                continue;
            }

            if !self.reflector.is_subtype(&candidate, &interface) {
                tracing::debug!("Class \"{}\" does not implement \"{}\"", candidate, interface);
                continue;
            }

            tracing::debug!("Found class \"{}\" for \"{}\"", candidate, interface);
            return Some(candidate);
        }

        tracing::debug!("No class found for \"{}\"", interface);
        None
    }
}

impl std::fmt::Debug for DefaultImplementationFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultImplementationFinder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{ClassBuilder, InterfaceBuilder, TypeRegistry};

    trait Cache: Send + Sync {}

    #[derive(Default)]
    struct MemoryCache;
    impl Cache for MemoryCache {}

    #[derive(Default)]
    struct Unrelated;

    fn finder(registry: TypeRegistry) -> DefaultImplementationFinder {
        DefaultImplementationFinder::new(Arc::new(registry))
    }

    #[test]
    fn test_earlier_candidate_wins() {
        let registry = TypeRegistry::new()
            .with(InterfaceBuilder::<dyn Cache>::new("store::CacheInterface").build())
            .with(
                ClassBuilder::<MemoryCache>::new("store::NullCache")
                    .implements("store::CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            )
            .with(
                ClassBuilder::<MemoryCache>::new("store::DefaultCacheImpl")
                    .implements("store::CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            );

        let found = finder(registry).find_implementation("store::CacheInterface");
        assert_eq!(found.as_ref().map(TypeName::as_str), Some("store::DefaultCacheImpl"));
    }

    #[test]
    fn test_default_name_beats_impl_suffix() {
        let registry = TypeRegistry::new()
            .with(InterfaceBuilder::<dyn Cache>::new("store::CacheInterface").build())
            .with(
                ClassBuilder::<MemoryCache>::new("store::DefaultCacheImpl")
                    .implements("store::CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            )
            .with(
                ClassBuilder::<MemoryCache>::new("store::NullCache")
                    .implements("store::CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            )
            .with(
                ClassBuilder::<MemoryCache>::new("store::DefaultCache")
                    .implements("store::CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            );

        let found = finder(registry).find_implementation("store::CacheInterface");
        assert_eq!(found.as_ref().map(TypeName::as_str), Some("store::DefaultCache"));
    }

    #[test]
    fn test_non_conforming_candidate_is_skipped() {
        let registry = TypeRegistry::new()
            .with(InterfaceBuilder::<dyn Cache>::new("store::CacheInterface").build())
            .with(ClassBuilder::<Unrelated>::new("store::DefaultCache").default_constructor().build())
            .with(
                ClassBuilder::<MemoryCache>::new("store::NullCache")
                    .implements("store::CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            );

        let found = finder(registry).find_implementation("::store::CacheInterface");
        assert_eq!(found.as_ref().map(TypeName::as_str), Some("store::NullCache"));
    }

    #[test]
    fn test_name_without_namespace() {
        let registry = TypeRegistry::new()
            .with(InterfaceBuilder::<dyn Cache>::new("CacheInterface").build())
            .with(
                ClassBuilder::<MemoryCache>::new("DefaultCache")
                    .implements("CacheInterface", |this| this as Arc<dyn Cache>)
                    .default_constructor()
                    .build(),
            );

        let found = finder(registry).find_implementation("CacheInterface");
        assert_eq!(found.as_ref().map(TypeName::as_str), Some("DefaultCache"));
    }

    #[test]
    fn test_convention_violation() {
        let finder = finder(TypeRegistry::new());
        assert_eq!(finder.find_implementation("store::CacheInterfaceImpl"), None);
        assert_eq!(finder.find_implementation("store::Cache"), None);
    }
}
