pub mod browse;
pub mod lookup;
pub mod publish;

pub use browse::BrowseUseCase;
pub use lookup::LookupUseCase;
pub use publish::PublishRecordUseCase;
