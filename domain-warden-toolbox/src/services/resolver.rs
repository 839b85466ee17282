//! Shared DNS resolver.

use std::sync::LazyLock;

use hickory_resolver::{
    TokioResolver,
    config::{ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
};

/// Process-wide resolver built from the host configuration.
///
/// Falls back to Hickory's default upstream set when the system configuration
/// (e.g. `/etc/resolv.conf`) cannot be read.
pub(crate) static DEFAULT_RESOLVER: LazyLock<TokioResolver> = LazyLock::new(build_system_resolver);

fn build_system_resolver() -> TokioResolver {
    #[cfg(any(unix, target_os = "windows"))]
    {
        match TokioResolver::builder_tokio() {
            Ok(mut builder) => {
                // Health checks must see the current answer, not a cached negative one.
                builder.options_mut().negative_max_ttl = Some(std::time::Duration::from_secs(30));
                return builder.build();
            }
            Err(e) => {
                log::warn!(
                    "Failed to load system DNS configuration, falling back to defaults: {e}"
                );
            }
        }
    }

    TokioResolver::builder_with_config(
        ResolverConfig::default(),
        TokioConnectionProvider::default(),
    )
    .with_options(ResolverOpts::default())
    .build()
}
