//! Exclusion of matches that overlap another iterator's matches.

use crate::spans::{DocId, Payload, Spans};

/// Matches of `include` that no match of `exclude` comes near.
///
/// An include match `[s, e)` is dropped when some exclude match in the same
/// document overlaps the widened window `[s - pre, e + post)`. The exclude
/// iterator only ever moves forward: exclude matches that end before the
/// current window can never matter again.
pub struct NotSpans {
    /// Iterator whose matches are reported.
    include: Box<dyn Spans>,
    /// Iterator whose matches veto include matches.
    exclude: Box<dyn Spans>,
    /// Positions the window extends before an include match.
    pre: i64,
    /// Positions the window extends after an include match.
    post: i64,
    /// Whether `include` may still produce matches.
    more_include: bool,
    /// Whether `exclude` may still produce matches, `None` until started.
    more_exclude: Option<bool>,
}

impl NotSpans {
    /// Creates an exclusion. Negative tolerances are treated as zero.
    pub fn new(include: Box<dyn Spans>, exclude: Box<dyn Spans>, pre: i32, post: i32) -> Self {
        Self {
            include,
            exclude,
            pre: i64::from(pre.max(0)),
            post: i64::from(post.max(0)),
            more_include: true,
            more_exclude: None,
        }
    }

    /// Starts `exclude` on first use.
    fn more_exclude(&mut self) -> bool {
        *self.more_exclude.get_or_insert_with(|| self.exclude.next())
    }

    /// Moves `exclude` up to the current include match and reports whether
    /// that match is clear of every exclusion.
    fn include_is_clear(&mut self) -> bool {
        let mut more_exclude = self.more_exclude();
        let doc = self.include.doc();
        if more_exclude && doc > self.exclude.doc() {
            more_exclude = self.exclude.skip_to(doc);
        }
        let window_start = i64::from(self.include.start()) - self.pre;
        while more_exclude
            && self.exclude.doc() == doc
            && i64::from(self.exclude.end()) <= window_start
        {
            more_exclude = self.exclude.next();
        }
        self.more_exclude = Some(more_exclude);

        !more_exclude
            || self.exclude.doc() != doc
            || i64::from(self.include.end()) + self.post <= i64::from(self.exclude.start())
    }
}

impl Spans for NotSpans {
    fn next(&mut self) -> bool {
        if self.more_include {
            self.more_include = self.include.next();
        }
        while self.more_include && !self.include_is_clear() {
            self.more_include = self.include.next();
        }
        self.more_include
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        if self.more_include {
            self.more_include = self.include.skip_to(target);
        }
        if !self.more_include {
            return false;
        }
        if self.include_is_clear() {
            return true;
        }
        self.next()
    }

    fn doc(&self) -> DocId {
        self.include.doc()
    }

    fn start(&self) -> u32 {
        self.include.start()
    }

    fn end(&self) -> u32 {
        self.include.end()
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        self.include.take_payload()
    }

    fn is_payload_available(&self) -> bool {
        self.include.is_payload_available()
    }

    fn cost(&self) -> u64 {
        self.include.cost()
    }
}
