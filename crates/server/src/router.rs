use axum::routing::{get, MethodRouter};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Register a route with and without a trailing slash; clients use both
/// forms interchangeably.
fn dual(router: Router<AppState>, path: &str, method_router: MethodRouter<AppState>) -> Router<AppState> {
    let with_slash = format!("{}/", path);
    router
        .route(path, method_router.clone())
        .route(&with_slash, method_router)
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new().route("/", get(handlers::root::index));

    router = dual(router, "/networks", get(handlers::networks::list));
    router = dual(router, "/countries", get(handlers::countries::list));

    router = dual(router, "/hegemony", get(handlers::hegemony::scores));
    router = dual(router, "/hegemony/cones", get(handlers::hegemony::cones));
    router = dual(router, "/hegemony/alarms", get(handlers::hegemony::alarms));
    router = dual(router, "/hegemony/countries", get(handlers::hegemony::countries));
    router = dual(router, "/hegemony/prefixes", get(handlers::hegemony::prefixes));

    router = dual(router, "/tr_hegemony", get(handlers::tr_hegemony::list));

    router = dual(router, "/network_delay", get(handlers::network_delay::delays));
    router = dual(
        router,
        "/network_delay/locations",
        get(handlers::network_delay::locations),
    );
    router = dual(
        router,
        "/network_delay/alarms",
        get(handlers::network_delay::alarms),
    );

    router = dual(router, "/link/delay", get(handlers::link::delay));
    router = dual(router, "/link/forwarding", get(handlers::link::forwarding));
    router = dual(router, "/link/delay/alarms", get(handlers::link::delay_alarms));
    router = dual(
        router,
        "/link/forwarding/alarms",
        get(handlers::link::forwarding_alarms),
    );

    router = dual(router, "/disco/events", get(handlers::disco::events));
    router = dual(router, "/disco/probes", get(handlers::disco::probes));

    router = dual(
        router,
        "/metis/atlas/deployment",
        get(handlers::metis::deployment),
    );
    router = dual(
        router,
        "/metis/atlas/selection",
        get(handlers::metis::selection),
    );

    router.with_state(state)
}
