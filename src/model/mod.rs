pub mod analysis;
mod manual;
mod record;

pub use analysis::{
    BaseProperties, GraniteAnalysis, LimestoneAnalysis, OtherAnalysis, RecordDecoder,
    RockAnalysis, SandstoneAnalysis, ShaleAnalysis, SlateAnalysis, TypedDecoder,
    check_conformance, decoder_for,
};
pub use manual::build_record;
pub use record::RockRecord;
