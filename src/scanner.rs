use crate::pattern::Matcher;
use motifscan_protocol::MotifMatch;

/// Non-overlapping left-to-right scan of one matcher over one sequence.
///
/// After a match the scan resumes at the match's end; otherwise it advances
/// one position. Empty matches are skipped.
pub fn scan_pattern(motif: &str, matcher: &Matcher, sequence: &[u8]) -> Vec<MotifMatch> {
    let mut ret = vec![];
    let mut pos = 0;
    while pos <= sequence.len() {
        let Some((from, to)) = matcher.find_at(sequence, pos) else {
            break;
        };
        if to > from {
            ret.push(MotifMatch::from_span(motif, sequence, from, to));
            pos = to;
        } else {
            pos = from + 1;
        }
    }
    ret
}
