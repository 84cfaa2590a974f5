use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod features;
pub mod model;
pub mod training;

pub use intake;
