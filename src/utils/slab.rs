//! Generational slab used as the continuation arena.
//!
//! Slots are reused after removal, but every reuse bumps the slot's
//! generation so a key handed out earlier never resolves to a later value.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Key {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub(crate) struct Slab<T> {
    items: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, item: T) -> Key {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.items[index as usize];
            slot.value = Some(item);

            return Key {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.items.len()).expect("slab index overflow");
        self.items.push(Slot {
            generation: 0,
            value: Some(item),
        });

        Key {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        self.items
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.items.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }

        let item = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;

        Some(item)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every live value, returning it with its key.
    pub(crate) fn drain(&mut self) -> Vec<(Key, T)> {
        let drained = self
            .items
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let value = slot.value.take()?;
                let key = Key {
                    index: index as u32,
                    generation: slot.generation,
                };
                slot.generation = slot.generation.wrapping_add(1);
                Some((key, value))
            })
            .collect();

        self.free = (0..self.items.len() as u32).rev().collect();
        self.len = 0;

        drained
    }
}
