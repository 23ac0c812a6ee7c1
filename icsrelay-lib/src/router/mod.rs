mod router_main;
mod router_serve_req;
mod socket;

pub(crate) use router_main::Router;
