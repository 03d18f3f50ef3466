/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Finishes the "no high level API yet" gap called out in the crate root
//! doc comment: a single function that turns a complete, in-memory YAML
//! string into the full [`Event`] sequence it produces.
//!
//! Everything downstream of the scanner already exists (`Parser`,
//! `PeekReader`, `BorrowReader`); this just wires them together for the
//! one case this crate actually needs: a whole rendered template output,
//! never a streaming or chunked source.

use crate::{
    event::{
        error::{ParseError, ParseResult as Result},
        parser::Parser,
        types::Event,
    },
    reader::{borrow::BorrowReader, Reader},
    scanner::flag::O_ZEROED,
};

/// Parse a complete, borrowed YAML string into its [`Event`] sequence.
///
/// The source is assumed whole (not extendable), matching `O_ZEROED`; a
/// scalar-eager scan is used since this crate always re-walks the full
/// result immediately afterwards.
pub(crate) fn parse_str(src: &str) -> Result<Vec<Event<'_>>>
{
    let borrow = BorrowReader::new(src);

    parse_borrowed(&borrow)
}

fn parse_borrowed<'de>(borrow: &'de BorrowReader<'de>) -> Result<Vec<Event<'de>>>
{
    let mut reader = crate::reader::PeekReader::new(Reader::new(borrow, O_ZEROED));
    let mut parser = Parser::new();
    let mut events = Vec::new();

    loop
    {
        match parser.next_event(&mut reader)
        {
            Some(Ok(event)) =>
            {
                let is_end = matches!(event.data(), crate::event::types::EventData::StreamEnd);

                events.push(event);

                if is_end
                {
                    break;
                }
            },
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::event::types::EventData;

    #[test]
    fn flat_mapping() -> Result<()>
    {
        let events = parse_str("{ hello: world }")?;

        assert!(events
            .iter()
            .any(|e| matches!(e.data(), EventData::MappingStart(_))));
        assert!(events
            .iter()
            .any(|e| matches!(e.data(), EventData::Scalar(_))));

        Ok(())
    }

    #[test]
    fn sequence() -> Result<()>
    {
        let events = parse_str("[1, 2, 3]")?;

        assert!(events
            .iter()
            .any(|e| matches!(e.data(), EventData::SequenceStart(_))));

        Ok(())
    }
}
