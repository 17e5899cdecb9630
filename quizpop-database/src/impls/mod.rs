pub mod badges;
pub mod challenges;
pub mod profiles;
