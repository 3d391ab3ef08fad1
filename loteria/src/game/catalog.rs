//! The card catalog and board draws.

use rand::{Rng, seq::SliceRandom};
use std::collections::HashSet;

use super::entities::{Card, CardId};

/// (id, name, verse, cultural note)
const STANDARD_CARDS: [(CardId, &str, &str, &str); 25] = [
    (1, "La Muerte", "La flaca bonita", "Figura central del Día de Muertos, la transición entre la vida y la muerte."),
    (2, "El Corazón", "No me olvides", "Amor eterno y memoria de los que han partido."),
    (3, "La Rosa", "La que se dio a todos", "Belleza efímera que adorna tumbas y altares."),
    (4, "El Sol", "La cobija de los pobres", "La luz que guía a las almas de regreso a casa."),
    (5, "La Luna", "El farol de los enamorados", "El ciclo de la vida y la muerte."),
    (6, "La Estrella", "La guía de los marineros", "Esperanza y guía espiritual para las almas."),
    (7, "El Árbol", "El que a todos cobija", "Raíces en la tierra y ramas al cielo, une ambos mundos."),
    (8, "La Calavera", "Al que le toque", "La muerte festiva y colorida, parte natural de la vida."),
    (9, "El Diablo", "Portate bien cuatito", "El equilibrio entre el bien y el mal."),
    (10, "La Sirena", "Con los cantos de sirena", "Almas que cantan para guiar a otros espíritus."),
    (11, "El Músico", "El que toca la guitarra", "La música llama a las almas de los difuntos."),
    (12, "La Dama", "Puliendo el paso por toda la calle", "Elegancia para recibir a los muertos en su visita."),
    (13, "El Catrin", "Don Ferruco en el baile", "Igualdad ante la muerte sin importar la clase social."),
    (14, "La Campana", "Tú con la campana y yo con el badajo", "Su sonido guía a las almas."),
    (15, "El Mundo", "Este mundo es una bola", "Vivos y muertos unidos en la celebración."),
    (16, "La Mano", "La mano del criminal", "Los actos en vida nos acompañan en el más allá."),
    (17, "El Pescado", "El que por la boca muere", "Abundancia en las ofrendas para las almas visitantes."),
    (18, "La Palma", "Llevame a la palma", "Triunfo espiritual y elevación del alma."),
    (19, "La Maceta", "El que nace pa maceta", "El cultivo de la memoria, como el cempasúchil."),
    (20, "El Arpa", "Arpa vieja de mi suegra", "Música celestial que acompaña a las almas."),
    (21, "La Rana", "Al ver a la rana", "Transformación y renacimiento."),
    (22, "El Nopal", "Al nopal lo van a ver", "Resistencia y supervivencia."),
    (23, "El Soldado", "Don ferruco en el cuartel", "Honra a los caídos en batalla."),
    (24, "La Corona", "La corona del rey", "En la muerte todos somos iguales."),
    (25, "El Paraguas", "Para el sol y para el agua", "Amparo para las almas en su viaje entre mundos."),
];

/// Ordered, immutable list of the cards a round is played with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The traditional 25-card catalog.
    pub fn standard() -> Self {
        let cards = STANDARD_CARDS
            .iter()
            .map(|(id, name, phrase, note)| Card::new(*id, name, phrase).with_note(note))
            .collect();
        Self { cards }
    }

    /// Build a catalog from arbitrary cards, dropping repeated ids.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        let mut seen = HashSet::new();
        let cards = cards
            .into_iter()
            .filter(|card| {
                let fresh = seen.insert(card.id);
                if !fresh {
                    log::warn!("Dropping duplicate card id {} from catalog", card.id);
                }
                fresh
            })
            .collect();
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Case-insensitive lookup by card name.
    pub fn find_by_name(&self, name: &str) -> Option<&Card> {
        let wanted = name.to_lowercase();
        self.cards
            .iter()
            .find(|card| card.name.to_lowercase() == wanted)
    }

    /// Cards carrying a cultural note.
    pub fn cultural_cards(&self) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|card| card.cultural_note.is_some())
            .collect()
    }

    /// Draw `count` distinct cards in random order.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of cards wanted, clamped to the catalog size
    /// * `rng` - Source of randomness for the shuffle
    ///
    /// # Returns
    ///
    /// * `Vec<Card>` - Cards drawn without replacement
    pub fn random_cards<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Card> {
        let count = if count > self.cards.len() {
            log::warn!(
                "Requested {} cards but the catalog only holds {}",
                count,
                self.cards.len()
            );
            self.cards.len()
        } else {
            count
        };

        let mut shuffled = self.cards.clone();
        shuffled.shuffle(rng);
        shuffled.truncate(count);

        log::debug!("Drew {} random cards", shuffled.len());
        shuffled
    }
}
