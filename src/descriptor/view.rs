use super::FieldSpec;
use crate::Builder;

#[derive(Debug, Clone, Copy)]
struct WordSlot<V> {
    cached: Option<V>,
    dirty: bool,
}

impl<V> WordSlot<V> {
    const EMPTY: Self = Self {
        cached: None,
        dirty: false,
    };
}

/// Lazy view over the words of a packed descriptor
///
/// Words are extracted on first use and cached. Writes go into the cache and mark the word
/// dirty, [`FieldView::materialize`] merges all dirty words back in a single pass.
#[derive(Debug, Clone)]
pub struct FieldView<V, const N: usize> {
    words: V,
    slots: [WordSlot<V>; N],
}

impl<V: Copy, const N: usize> FieldView<V, N> {
    pub fn bind(words: V) -> Self {
        Self {
            words,
            slots: [WordSlot::EMPTY; N],
        }
    }

    /// Drop all cached state and view `words` instead
    pub fn rebind(&mut self, words: V) {
        self.words = words;
        self.slots = [WordSlot::EMPTY; N];
    }

    pub fn is_dirty(&self, word: usize) -> bool {
        self.slot(word).dirty
    }

    fn slot(&self, word: usize) -> &WordSlot<V> {
        assert!(word < N, "descriptor word {word} out of range, descriptor has {N} words");
        &self.slots[word]
    }

    fn word<B>(&mut self, b: &mut B, word: usize) -> V
    where
        B: Builder<Value = V>,
    {
        if let Some(cached) = self.slot(word).cached {
            return cached;
        }

        let value = b.extract(self.words, word);
        self.slots[word].cached = Some(value);
        value
    }

    pub fn get<B>(&mut self, b: &mut B, spec: FieldSpec) -> V
    where
        B: Builder<Value = V>,
    {
        let word = self.word(b, spec.word);

        if spec.is_full_word() {
            word
        } else {
            b.ubfe(word, spec.offset, spec.width)
        }
    }

    pub fn set<B>(&mut self, b: &mut B, spec: FieldSpec, value: V)
    where
        B: Builder<Value = V>,
    {
        let new = if spec.is_full_word() {
            // still bounds checks the index
            self.slot(spec.word);
            value
        } else {
            let word = self.word(b, spec.word);

            let kept = b.and_u(word, !spec.word_mask());
            let shifted = b.shl_u(value, spec.offset);
            let placed = b.and_u(shifted, spec.word_mask());
            b.or(kept, placed)
        };

        self.slots[spec.word] = WordSlot {
            cached: Some(new),
            dirty: true,
        };
    }

    /// Write all dirty words back and return the resulting descriptor
    pub fn materialize<B>(&mut self, b: &mut B) -> V
    where
        B: Builder<Value = V>,
    {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.dirty {
                continue;
            }

            if let Some(cached) = slot.cached {
                self.words = b.insert(self.words, cached, i);
            }

            slot.dirty = false;
        }

        self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::interp::{FetchRecord, Interpreter, Value};

    fn interp() -> Interpreter<impl crate::builder::interp::TexelFetch> {
        Interpreter::new(|_: &FetchRecord| [0.0; 4])
    }

    #[test]
    fn round_trip_on_zero_and_one_words() {
        let specs = [
            FieldSpec::new(0, 0, 1),
            FieldSpec::new(1, 20, 9),
            FieldSpec::new(2, 14, 14),
            FieldSpec::new(3, 30, 2),
            FieldSpec::new(3, 0, 31),
        ];

        for fill in [0u32, u32::MAX] {
            for spec in specs {
                for v in [0u32, 1, 0x5555_5555, u32::MAX] {
                    let mut b = interp();
                    let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[fill; 4]));

                    let value = b.const_u32(v);
                    view.set(&mut b, spec, value);

                    let got = view.get(&mut b, spec);
                    assert_eq!(got.as_u32(), &[v & spec.value_mask()], "{spec:?} fill={fill:#x}");
                }
            }
        }
    }

    #[test]
    fn set_leaves_neighbouring_bits_alone() {
        let mut b = interp();
        let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[u32::MAX; 4]));

        let zero = b.const_u32(0);
        view.set(&mut b, FieldSpec::new(2, 20, 4), zero);
        let out = view.materialize(&mut b);

        assert_eq!(out.as_u32(), &[u32::MAX, u32::MAX, !0x00F0_0000, u32::MAX]);
    }

    #[test]
    fn materialize_only_touches_dirty_words() {
        let mut b = interp();
        let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[1, 2, 3, 4]));

        let v = b.const_u32(9);
        view.set(&mut b, FieldSpec::new(1, 0, 32), v);
        assert!(view.is_dirty(1));
        assert!(!view.is_dirty(0));

        let out = view.materialize(&mut b);
        assert_eq!(out.as_u32(), &[1, 9, 3, 4]);
        assert!(!view.is_dirty(1));
    }

    #[test]
    fn materialize_twice_is_idempotent() {
        let mut b = interp();
        let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[0; 4]));

        for word in 0..4 {
            let v = b.const_u32(word as u32 + 1);
            view.set(&mut b, FieldSpec::new(word, 4, 8), v);
        }

        let first = view.materialize(&mut b);
        let ops = b.op_count();
        let second = view.materialize(&mut b);

        assert_eq!(first, second);
        assert_eq!(ops, b.op_count());
    }

    #[test]
    fn words_are_extracted_once() {
        let mut b = interp();
        let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[0xABCD; 4]));

        view.get(&mut b, FieldSpec::new(0, 0, 4));
        let ops = b.op_count();
        view.get(&mut b, FieldSpec::new(0, 4, 4));

        // only the ubfe, the word itself is cached
        assert_eq!(b.op_count(), ops + 1);
    }

    #[test]
    fn rebind_drops_cache() {
        let mut b = interp();
        let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[1; 4]));

        let v = b.const_u32(7);
        view.set(&mut b, FieldSpec::new(0, 0, 32), v);
        view.rebind(Value::u32_vec(&[2; 4]));

        assert!(!view.is_dirty(0));
        assert_eq!(view.get(&mut b, FieldSpec::new(0, 0, 32)).as_u32(), &[2]);
    }

    #[test]
    #[should_panic]
    fn out_of_range_word_panics() {
        let mut b = interp();
        let mut view = FieldView::<Value, 4>::bind(Value::u32_vec(&[0; 4]));

        view.get(&mut b, FieldSpec::new(4, 0, 8));
    }
}
