//! Route resolution through the navigation guard.

use pachamama_storefront::Storefront;
use pachamama_storefront::middleware::Navigation;

/// Resolve `path` the way the storefront would before rendering it.
pub async fn navigate(storefront: &Storefront, path: &str) {
    match storefront.guard().navigate(path).await {
        Navigation::Allow { path, route } => {
            tracing::info!("{} -> {} ({})", route.route.path, path, route.route.name);
            for (name, value) in &route.params {
                tracing::info!("  {name} = {value}");
            }
        }
        Navigation::Redirect { to } => tracing::info!("Redirect to {to}"),
        Navigation::NotFound => tracing::warn!("No route matches {path}"),
    }
}
