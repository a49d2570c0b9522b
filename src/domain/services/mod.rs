mod selection;

pub use selection::SelectionPolicy;
