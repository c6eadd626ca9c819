pub mod content;
pub mod crafting;
pub mod profile;
pub mod treasury;

pub use content::{GalleryAlbum, LocationKind, MapLocation, RosterMember, Story};
pub use crafting::{AcquisitionData, CraftingItem, IngredientDetail, Material, SubIngredient};
pub use profile::{LoginRequest, Profile, ProfileResponse, Role};
pub use treasury::{
    ActivityEntry, ActivityLine, CategoryStock, FeedLineRow, FeedTransactionRow, ItemCategory,
    TransactionKind, TransactionLineItem, TreasuryItem, TreasuryTransaction,
};
