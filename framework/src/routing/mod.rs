mod router;

pub use router::{Handler, Route, RouteBuilder, RouteTable};
