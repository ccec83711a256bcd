//! Aggregation state: an ordered skiplist keyed by the bounding period of
//! its temporal elements, with a deterministic balanced bulk-load and a
//! splice that recombines the overlapped region through a caller-supplied
//! combiner.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::aggregation::AggContext;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::errors::{Error, Result};
use crate::temporal::base::{wire, BaseKind, BaseType};
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::lifting::lift_sequences;
use crate::temporal::temporal::Temporal;
use crate::temporal::tinstant::TInstant;
use crate::temporal::tsequence::TSequence;
use crate::temporal::tsequence_set::TSequenceSet;

pub(crate) const SKIPLIST_MAX_LEVEL: usize = 24;

const HEAD: usize = 0;
const NONE: i32 = -1;

/// Binary combiner applied where spliced elements overlap.
pub type Combiner<B> = fn(&B, &B) -> B;

#[derive(Debug, Clone)]
struct Elem<B: BaseType> {
    /// `None` for the head and tail sentinels.
    value: Option<Temporal<B>>,
    height: usize,
    next: [i32; SKIPLIST_MAX_LEVEL],
}

impl<B: BaseType> Elem<B> {
    fn empty() -> Self {
        Self { value: None, height: 0, next: [NONE; SKIPLIST_MAX_LEVEL] }
    }
}

/// Where a timestamp falls relative to a stored element: `After` means the
/// element lies entirely before the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelPos {
    Before,
    During,
    After,
}

fn pos_period_timestamp(period: &TsTzSpan, t: DateTime<Utc>) -> RelPos {
    if period.lower() > t || (period.lower() == t && !period.is_lower_inclusive()) {
        return RelPos::Before;
    }
    if period.upper() < t || (period.upper() == t && !period.is_upper_inclusive()) {
        return RelPos::After;
    }
    RelPos::During
}

/// Ordered aggregation state over instant-kind or sequence-kind temporal
/// elements. After every splice the list stays sorted, non-overlapping, and
/// pointwise equal to the aggregate of all ingested batches.
#[derive(Debug, Clone)]
pub struct SkipList<B: BaseType> {
    elems: Vec<Elem<B>>,
    freed: Vec<usize>,
    tail: usize,
    length: usize,
    extra: Vec<u8>,
}

impl<B: BaseType> SkipList<B> {
    /// Bulk-loads a deterministically balanced list: height `⌈log2 n⌉`,
    /// level `ℓ` linked at stride `2^ℓ`.
    pub fn make(values: &[Temporal<B>]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::invalid("a skiplist requires at least one value"));
        }
        for value in values {
            ensure_element_kind(value)?;
        }
        let count = values.len() + 2;
        let height = (((count - 1) as f64).log2().ceil() as usize).max(1);
        let mut elems: Vec<Elem<B>> = (0..count).map(|_| Elem::empty()).collect();
        for (i, value) in values.iter().enumerate() {
            elems[i + 1].value = Some(value.clone());
        }
        for level in 0..height {
            let step = 1usize << level;
            let mut i = 0;
            while i < count {
                if i != count - 1 {
                    let next = if i + step < count { i + step } else { count - 1 };
                    elems[i].next[level] = next as i32;
                    elems[i].height = level + 1;
                } else {
                    elems[i].next[level] = NONE;
                    elems[i].height = height;
                }
                i += step;
            }
        }
        debug!(values = values.len(), height, "bulk-loaded aggregation skiplist");
        Ok(Self {
            elems,
            freed: Vec::new(),
            tail: count - 1,
            length: values.len(),
            extra: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Opaque caller-owned blob carried with the state (e.g. an SRID).
    pub fn extra(&self) -> &[u8] {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: Vec<u8>) {
        self.extra = extra;
    }

    /// First stored value.
    pub fn head_value(&self) -> Option<&Temporal<B>> {
        let first = self.elems[HEAD].next[0];
        if first == NONE || first as usize == self.tail {
            return None;
        }
        self.elems[first as usize].value.as_ref()
    }

    /// Stored values in time order.
    pub fn values(&self) -> Vec<&Temporal<B>> {
        let mut result = Vec::with_capacity(self.length);
        let mut cur = self.elems[HEAD].next[0];
        while cur != NONE && cur as usize != self.tail {
            let elem = &self.elems[cur as usize];
            if let Some(value) = &elem.value {
                result.push(value);
            }
            cur = elem.next[0];
        }
        result
    }

    fn alloc(&mut self) -> usize {
        self.length += 1;
        match self.freed.pop() {
            Some(idx) => idx,
            None => {
                self.elems.push(Elem::empty());
                self.elems.len() - 1
            }
        }
    }

    fn free(&mut self, idx: usize) {
        self.elems[idx].value = None;
        self.freed.push(idx);
        self.length -= 1;
    }

    fn elem_pos(&self, idx: i32, t: DateTime<Utc>) -> RelPos {
        if idx as usize == HEAD {
            return RelPos::After; // head is -inf
        }
        if idx == NONE || idx as usize == self.tail {
            return RelPos::Before; // tail is +inf
        }
        match &self.elems[idx as usize].value {
            Some(Temporal::Instant(inst)) => {
                if inst.timestamp() > t {
                    RelPos::Before
                } else if inst.timestamp() < t {
                    RelPos::After
                } else {
                    RelPos::During
                }
            }
            Some(value) => pos_period_timestamp(&value.timespan(), t),
            None => RelPos::Before,
        }
    }

    /// Splices a time-ordered, non-overlapping batch into the list,
    /// rebuilding the overlapped region with `combiner`.
    ///
    /// With `crossings`, the combiner walk inserts the crossing instants of
    /// overlapping linear segments so piecewise extrema stay exact.
    ///
    /// On `Cancelled` the state is no longer meaningful and must be
    /// discarded by the caller.
    pub fn splice(
        &mut self,
        ctx: &mut AggContext,
        values: &[Temporal<B>],
        combiner: Combiner<B>,
        crossings: bool,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        ctx.check_cancelled()?;
        let head_is_instant = matches!(self.head_value(), Some(Temporal::Instant(_)));
        for value in values {
            ensure_element_kind(value)?;
            if matches!(value, Temporal::Instant(_)) != head_is_instant {
                return Err(Error::invalid(
                    "cannot aggregate temporal values of different subtypes",
                ));
            }
        }
        let envelope = batch_envelope(values);

        // Rightmost node strictly before the envelope, per level.
        let mut update = [HEAD as i32; SKIPLIST_MAX_LEVEL];
        let mut cur = HEAD as i32;
        let mut height = self.elems[HEAD].height;
        for level in (0..height).rev() {
            loop {
                let next = self.elems[cur as usize].next[level];
                if next != NONE && self.elem_pos(next, envelope.lower()) == RelPos::After {
                    cur = next;
                } else {
                    break;
                }
            }
            update[level] = cur;
        }

        // Collect and unthread every node overlapping the envelope.
        let lower = self.elems[cur as usize].next[0];
        let mut spliced: Vec<Temporal<B>> = Vec::new();
        let mut cur = lower;
        while cur != NONE
            && self.elem_pos(cur, envelope.upper()) != RelPos::Before
        {
            ctx.check_cancelled()?;
            let next = self.elems[cur as usize].next[0];
            for level in 0..height {
                let prev = update[level];
                if self.elems[prev as usize].next[level] != cur {
                    break;
                }
                self.elems[prev as usize].next[level] =
                    self.elems[cur as usize].next[level];
            }
            if let Some(value) = self.elems[cur as usize].value.take() {
                spliced.push(value);
            }
            self.free(cur as usize);
            cur = next;
        }

        // Level down head and tail while the top level became empty.
        while self.elems[HEAD].height > 1
            && self.elems[HEAD].next[self.elems[HEAD].height - 1] == self.tail as i32
        {
            self.elems[HEAD].height -= 1;
            let tail = self.tail;
            self.elems[tail].height -= 1;
            height -= 1;
        }

        // Recompute the overlapped region through the combiner.
        let inserts: Vec<Temporal<B>> = if spliced.is_empty() {
            values.to_vec()
        } else {
            trace!(removed = spliced.len(), incoming = values.len(), "recombining overlap");
            if head_is_instant {
                instant_tagg(&spliced, values, combiner)
            } else {
                sequence_tagg(&spliced, values, combiner, crossings)
            }
        };

        // Insert in reverse so the shared update cursors keep time order.
        for value in inserts.iter().rev() {
            ctx.check_cancelled()?;
            let rheight = ctx.random_level();
            if rheight > height {
                for cursor in update.iter_mut().take(rheight).skip(height) {
                    *cursor = HEAD as i32;
                }
                self.elems[HEAD].height = rheight;
                let tail = self.tail;
                self.elems[tail].height = rheight;
            }
            let idx = self.alloc();
            self.elems[idx].value = Some(value.clone());
            self.elems[idx].height = rheight;
            for level in 0..rheight {
                let prev = update[level] as usize;
                self.elems[idx].next[level] = self.elems[prev].next[level];
                self.elems[prev].next[level] = idx as i32;
                if level >= height && update[0] as usize != self.tail {
                    self.elems[idx].next[level] = self.tail as i32;
                }
            }
            if rheight > height {
                height = rheight;
            }
        }
        Ok(())
    }

    // ------------------------- Wire format ----------------------------------

    /// Serializes the state: element count, subtype and base-type tags,
    /// each element, then the caller-owned extra blob.
    pub fn serialize(&self) -> Vec<u8> {
        let values = self.values();
        let mut buf = Vec::new();
        wire::put_u32(&mut buf, values.len() as u32);
        let sequence_kind = matches!(values.first(), Some(Temporal::Sequence(_)));
        buf.push(sequence_kind as u8);
        buf.push(B::KIND as u8);
        for value in &values {
            match value {
                Temporal::Instant(inst) => inst.write_to(&mut buf),
                Temporal::Sequence(seq) => write_sequence(seq, &mut buf),
                _ => debug_assert!(false, "skiplists store instants or sequences"),
            }
        }
        wire::put_u64(&mut buf, self.extra.len() as u64);
        buf.extend_from_slice(&self.extra);
        buf
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let cursor = &mut &bytes[..];
        let count = wire::take_u32(cursor)? as usize;
        let sequence_kind = wire::take_u8(cursor)? != 0;
        let kind = BaseKind::from_tag(wire::take_u8(cursor)?)?;
        if kind != B::KIND {
            return Err(Error::invalid("aggregate state base type mismatch"));
        }
        let mut values: Vec<Temporal<B>> = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(if sequence_kind {
                Temporal::Sequence(read_sequence(cursor)?)
            } else {
                Temporal::Instant(TInstant::read_from(cursor)?)
            });
        }
        let extra_len = wire::take_u64(cursor)? as usize;
        let extra = wire::take(cursor, extra_len)?.to_vec();
        let mut list = Self::make(&values)?;
        list.extra = extra;
        Ok(list)
    }
}

fn ensure_element_kind<B: BaseType>(value: &Temporal<B>) -> Result<()> {
    match value {
        Temporal::Instant(_) | Temporal::Sequence(_) => Ok(()),
        _ => Err(Error::Internal(
            "skiplist elements must be instants or sequences",
        )),
    }
}

/// Envelope of an incoming batch: hull of the first and last elements.
fn batch_envelope<B: BaseType>(values: &[Temporal<B>]) -> TsTzSpan {
    let first = values[0].timespan();
    let last = values[values.len() - 1].timespan();
    TsTzSpan::new(
        first.lower(),
        last.upper(),
        first.is_lower_inclusive(),
        last.is_upper_inclusive(),
    )
    .expect("batches are time-ordered")
}

fn write_sequence<B: BaseType>(seq: &TSequence<B>, buf: &mut Vec<u8>) {
    wire::put_u32(buf, seq.num_instants() as u32);
    buf.push(seq.is_lower_inclusive() as u8);
    buf.push(seq.is_upper_inclusive() as u8);
    buf.push((seq.interpolation() == TInterpolation::Linear) as u8);
    for inst in seq.instants() {
        inst.write_to(buf);
    }
}

fn read_sequence<B: BaseType>(cursor: &mut &[u8]) -> Result<TSequence<B>> {
    let count = wire::take_u32(cursor)? as usize;
    let lower_inc = wire::take_u8(cursor)? != 0;
    let upper_inc = wire::take_u8(cursor)? != 0;
    let interp = if wire::take_u8(cursor)? != 0 {
        TInterpolation::Linear
    } else {
        TInterpolation::Stepwise
    };
    let mut instants = Vec::with_capacity(count);
    for _ in 0..count {
        instants.push(TInstant::read_from(cursor)?);
    }
    TSequence::new(instants, lower_inc, upper_inc, interp, false)
}

/// Merge-combines two time-sorted instant arrays, applying the combiner at
/// shared timestamps.
pub(crate) fn instant_tagg<B: BaseType>(
    first: &[Temporal<B>],
    second: &[Temporal<B>],
    combiner: Combiner<B>,
) -> Vec<Temporal<B>> {
    let as_instants = |values: &[Temporal<B>]| -> Vec<TInstant<B>> {
        values
            .iter()
            .filter_map(|v| match v {
                Temporal::Instant(inst) => Some(inst.clone()),
                _ => None,
            })
            .collect()
    };
    let xs = as_instants(first);
    let ys = as_instants(second);
    let mut out: Vec<Temporal<B>> = Vec::with_capacity(xs.len() + ys.len());
    let (mut i, mut j) = (0, 0);
    while i < xs.len() && j < ys.len() {
        match xs[i].timestamp().cmp(&ys[j].timestamp()) {
            std::cmp::Ordering::Equal => {
                out.push(Temporal::Instant(TInstant::new(
                    combiner(xs[i].value(), ys[j].value()),
                    xs[i].timestamp(),
                )));
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                out.push(Temporal::Instant(xs[i].clone()));
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(Temporal::Instant(ys[j].clone()));
                j += 1;
            }
        }
    }
    out.extend(xs[i..].iter().cloned().map(Temporal::Instant));
    out.extend(ys[j..].iter().cloned().map(Temporal::Instant));
    out
}

/// Combines one overlapping sequence pair: the parts before and after the
/// intersection survive as-is, the intersection goes through the lifted
/// combiner. Returns normalized, time-ordered pieces.
fn sequence_tagg1<B: BaseType>(
    seq1: &TSequence<B>,
    seq2: &TSequence<B>,
    combiner: Combiner<B>,
    crossings: bool,
) -> Vec<TSequence<B>> {
    let p1 = seq1.period();
    let p2 = seq2.period();
    let inter = match p1.intersection(&p2) {
        Some(inter) => inter,
        None => {
            let mut pieces = vec![seq1.clone(), seq2.clone()];
            if p2.compare(&p1) == std::cmp::Ordering::Less {
                pieces.swap(0, 1);
            }
            return TSequenceSet::normalized(pieces);
        }
    };
    let mut pieces: Vec<TSequence<B>> = Vec::with_capacity(3);

    // Part before the intersection, from whichever operand covers it.
    for (seq, p) in [(seq1, &p1), (seq2, &p2)] {
        let starts_before = p.lower() < inter.lower()
            || (p.lower() == inter.lower()
                && p.is_lower_inclusive()
                && !inter.is_lower_inclusive());
        if starts_before {
            let before = TsTzSpan::new(
                p.lower(),
                inter.lower(),
                p.is_lower_inclusive(),
                !inter.is_lower_inclusive(),
            )
            .expect("intersection is inside both operands");
            pieces.push(seq.sub_sequence(&before));
            break;
        }
    }

    let finder: fn(&B, &B, &B, &B) -> Option<f64> = B::segment_crossing;
    let interior: Option<&dyn Fn(&B, &B, &B, &B) -> Option<f64>> =
        if crossings { Some(&finder) } else { None };
    if let Some(middle) =
        lift_sequences(seq1, seq2, &|a: &B, b: &B| combiner(a, b), true, interior)
    {
        pieces.push(middle);
    }

    // Part after the intersection.
    for (seq, p) in [(seq1, &p1), (seq2, &p2)] {
        let ends_after = inter.upper() < p.upper()
            || (inter.upper() == p.upper()
                && !inter.is_upper_inclusive()
                && p.is_upper_inclusive());
        if ends_after {
            let after = TsTzSpan::new(
                inter.upper(),
                p.upper(),
                !inter.is_upper_inclusive(),
                p.is_upper_inclusive(),
            )
            .expect("intersection is inside both operands");
            pieces.push(seq.sub_sequence(&after));
            break;
        }
    }
    TSequenceSet::normalized(pieces)
}

/// Merge-combines two time-sorted sequence arrays. The tail piece of every
/// overlap re-enters the walk on the side it extends.
pub(crate) fn sequence_tagg<B: BaseType>(
    first: &[Temporal<B>],
    second: &[Temporal<B>],
    combiner: Combiner<B>,
    crossings: bool,
) -> Vec<Temporal<B>> {
    let as_sequences = |values: &[Temporal<B>]| -> Vec<TSequence<B>> {
        values
            .iter()
            .filter_map(|v| match v {
                Temporal::Sequence(seq) => Some(seq.clone()),
                _ => None,
            })
            .collect()
    };
    let mut one = std::collections::VecDeque::from(as_sequences(first));
    let mut two = std::collections::VecDeque::from(as_sequences(second));
    let mut out: Vec<TSequence<B>> = Vec::new();
    let mut cur1 = one.pop_front();
    let mut cur2 = two.pop_front();
    while let (Some(s1), Some(s2)) = (cur1.as_ref(), cur2.as_ref()) {
        if !s1.period().overlaps(&s2.period()) {
            if s1.period().compare(&s2.period()) == std::cmp::Ordering::Less {
                out.push(cur1.take().expect("present"));
                cur1 = one.pop_front();
            } else {
                out.push(cur2.take().expect("present"));
                cur2 = two.pop_front();
            }
            continue;
        }
        let mut pieces = sequence_tagg1(s1, s2, combiner, crossings);
        match s1.period().upper_cmp(&s2.period()) {
            std::cmp::Ordering::Equal => {
                out.append(&mut pieces);
                cur1 = one.pop_front();
                cur2 = two.pop_front();
            }
            std::cmp::Ordering::Less => {
                let tail = pieces.pop();
                out.append(&mut pieces);
                cur2 = tail;
                cur1 = one.pop_front();
            }
            std::cmp::Ordering::Greater => {
                let tail = pieces.pop();
                out.append(&mut pieces);
                cur1 = tail;
                cur2 = two.pop_front();
            }
        }
    }
    while let Some(seq) = cur1.take() {
        out.push(seq);
        cur1 = one.pop_front();
    }
    while let Some(seq) = cur2.take() {
        out.push(seq);
        cur2 = two.pop_front();
    }
    TSequenceSet::normalized(out)
        .into_iter()
        .map(Temporal::Sequence)
        .collect()
}
