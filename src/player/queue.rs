use std::collections::VecDeque;
use tracing::info;

use crate::player::PlayerError;
use crate::sources::Track;

/// Cola de reproducción de un chat.
///
/// El frente es el track que suena (o está por sonar); el orden de inserción
/// es el orden de reproducción y sólo se elimina por el frente.
#[derive(Debug)]
pub struct ChatQueue {
    items: VecDeque<Track>,
    max_size: usize,
}

impl ChatQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Agrega un track al final; devuelve la posición 1-based
    pub fn push(&mut self, track: Track) -> Result<usize, PlayerError> {
        if self.items.len() >= self.max_size {
            return Err(PlayerError::QueueFull { max: self.max_size });
        }

        info!("➕ Agregado a la cola: {}", track.title);
        self.items.push_back(track);
        Ok(self.items.len())
    }

    /// Quita y devuelve el frente (el track que terminó o fue saltado)
    pub fn pop_front(&mut self) -> Option<Track> {
        self.items.pop_front()
    }

    pub fn head(&self) -> Option<&Track> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Vista acotada de los primeros `n` tracks, en orden de reproducción
    pub fn preview(&self, n: usize) -> Vec<Track> {
        self.items.iter().take(n).cloned().collect()
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            info!("🗑️ Cola limpiada ({} tracks)", self.items.len());
            self.items.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(title: &str) -> Track {
        Track::new(
            title.to_string(),
            format!("https://cdn.example/{title}.m4a"),
            "@tester".to_string(),
        )
    }

    #[test]
    fn push_returns_one_based_position() {
        let mut queue = ChatQueue::new(20);
        assert_eq!(queue.push(track("a")).unwrap(), 1);
        assert_eq!(queue.push(track("b")).unwrap(), 2);
        assert_eq!(queue.push(track("c")).unwrap(), 3);
    }

    #[test]
    fn pop_front_preserves_insertion_order() {
        let mut queue = ChatQueue::new(20);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();

        assert_eq!(queue.pop_front().unwrap().title, "a");
        assert_eq!(queue.head().unwrap().title, "b");
        assert_eq!(queue.pop_front().unwrap().title, "b");
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn rejects_pushes_beyond_cap_without_mutating() {
        let mut queue = ChatQueue::new(2);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();

        let result = queue.push(track("c"));
        assert!(matches!(result, Err(PlayerError::QueueFull { max: 2 })));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.head().unwrap().title, "a");
    }

    #[test]
    fn preview_is_bounded() {
        let mut queue = ChatQueue::new(20);
        for i in 0..15 {
            queue.push(track(&format!("t{i}"))).unwrap();
        }

        let preview = queue.preview(10);
        assert_eq!(preview.len(), 10);
        assert_eq!(preview[0].title, "t0");
        assert_eq!(preview[9].title, "t9");
        assert_eq!(queue.len(), 15);
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = ChatQueue::new(20);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();

        queue.clear();
        assert!(queue.is_empty());
        // idempotente
        queue.clear();
        assert!(queue.is_empty());
    }
}
