pub mod aggregate;
pub mod error;
pub mod prefix_reduce;
pub mod sample;
pub mod test_utils;

pub mod helpers {
    pub mod bootstrap;
    pub mod logging;
    pub mod stop;
}
