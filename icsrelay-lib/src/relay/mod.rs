mod relay_main;
mod upstream;

pub(crate) use relay_main::InnerRelay;
pub(crate) use upstream::UpstreamFetcher;
