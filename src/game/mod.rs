pub mod rating;
pub mod shot_ledger;
pub mod backfill;
pub mod matchups;
pub mod finish;
