//! `medgate-navigation` — permission-gated navigation.
//!
//! Pure functions over a declared [`RouteTable`] and the current
//! [`medgate_auth::AuthState`]: which sections/pages are visible, where an
//! identity lands after sign-in, and whether a routed page may render.
//! Nothing here errors at render time; absence of access is an empty list,
//! `None`, or a denied guard outcome.

pub mod declarations;
pub mod error;
pub mod filter;
pub mod guard;
pub mod landing;
pub mod routes;

pub use declarations::application_table;
pub use error::NavigationError;
pub use filter::{filter_routes, has_page_permission};
pub use guard::{guard_page, PageAccess};
pub use landing::resolve_landing_page;
pub use routes::{Layout, RoutePage, RouteSection, RouteTable};
