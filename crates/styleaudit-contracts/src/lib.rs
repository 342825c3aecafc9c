pub mod design;
pub mod events;
pub mod fonts;
pub mod guideline;
pub mod runs;
