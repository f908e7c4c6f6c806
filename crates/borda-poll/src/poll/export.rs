use csv::{Terminator, WriterBuilder};

use super::ballot::Ballot;

/// Header of the CSV download, independent of the candidate count.
pub const EXPORT_HEADER: [&str; 5] = ["rank1", "rank2", "rank3", "rank4", "rank5"];

pub const EXPORT_FILENAME: &str = "votes_export.csv";

/// Render the ballot log as CSV, one row per ballot in store order.
///
/// Rows are written as-is, so a poll with more than five candidates produces rows longer
/// than the header.
pub fn export_csv(ballots: &[Ballot]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;
    for ballot in ballots {
        writer.write_record(ballot.names())?;
    }

    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
