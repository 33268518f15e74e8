//! Content Store: the immutable quote catalog, the persona list and the
//! response bank keyed by `(persona style, category)`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::category::{Category, Intensity, PersonaStyle};
use crate::error::{CoreError, Result};

/// A quote card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u32,
    pub text: String,
    pub category: Category,
    pub intensity: Intensity,
}

impl ContentItem {
    pub fn new(id: u32, text: &str, category: Category, intensity: Intensity) -> Self {
        Self {
            id,
            text: text.to_string(),
            category,
            intensity,
        }
    }
}

/// A chat persona.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub style: PersonaStyle,
}

impl Persona {
    fn new(id: &str, name: &str, description: &str, style: PersonaStyle) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            style,
        }
    }
}

/// Scripted replies per `(style, category)`.
#[derive(Clone, Debug, Default)]
pub struct ResponseBank {
    buckets: HashMap<(PersonaStyle, Category), Vec<String>>,
}

impl ResponseBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bucket for a pair.
    pub fn insert(&mut self, style: PersonaStyle, category: Category, responses: &[&str]) {
        self.buckets.insert(
            (style, category),
            responses.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Look up a bucket. Empty buckets count as missing.
    pub fn get(&self, style: PersonaStyle, category: Category) -> Result<&[String]> {
        match self.buckets.get(&(style, category)) {
            Some(list) if !list.is_empty() => Ok(list.as_slice()),
            _ => Err(CoreError::NotFound { style, category }),
        }
    }
}

/// The full read-only content set.
#[derive(Clone, Debug)]
pub struct Catalog {
    quotes: Vec<ContentItem>,
    responses: ResponseBank,
    personas: Vec<Persona>,
}

impl Catalog {
    /// Build a catalog from arbitrary data. Not validated; see [`Catalog::validate`].
    pub fn new(quotes: Vec<ContentItem>, responses: ResponseBank, personas: Vec<Persona>) -> Self {
        Self {
            quotes,
            responses,
            personas,
        }
    }

    /// The built-in reference data.
    pub fn reference() -> Self {
        Self::new(reference_quotes(), reference_responses(), reference_personas())
    }

    /// Quotes in catalog order.
    pub fn list_quotes(&self) -> &[ContentItem] {
        &self.quotes
    }

    pub fn lookup_responses(&self, style: PersonaStyle, category: Category) -> Result<&[String]> {
        self.responses.get(style, category)
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// Persona by id; unknown ids fall back to the first persona.
    pub fn persona(&self, id: &str) -> Option<&Persona> {
        self.personas
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.personas.first())
    }

    /// Every style × category pair must resolve to a non-empty bucket.
    pub fn validate(&self) -> Result<()> {
        for style in PersonaStyle::ALL {
            for category in Category::ALL {
                self.responses.get(style, category)?;
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::reference()
    }
}

fn reference_quotes() -> Vec<ContentItem> {
    use Category::*;
    use Intensity::*;

    vec![
        ContentItem::new(1, "You're a slave to likes. Put the phone down.", SocialMedia, Extreme),
        ContentItem::new(2, "You know exactly what you were doing. Stop hiding it.", Porn, Extreme),
        ContentItem::new(3, "Your lungs are begging for mercy, genius.", Substance, Extreme),
        ContentItem::new(4, "Instagram won't fill the void in your life.", SocialMedia, Extreme),
        ContentItem::new(
            5,
            "You're wiring your brain to prefer pixels over real intimacy.",
            Porn,
            Moderate,
        ),
        ContentItem::new(
            6,
            "Each cigarette is another nail in your coffin. Keep it up, genius.",
            Substance,
            Moderate,
        ),
        ContentItem::new(
            7,
            "You've wasted years scrolling. What do you have to show for it?",
            SocialMedia,
            Moderate,
        ),
        ContentItem::new(8, "That dopamine hit from TikTok is making you a zombie.", SocialMedia, Moderate),
        ContentItem::new(9, "Nobody respects a habit you can't control. Not even you.", Porn, Extreme),
        ContentItem::new(10, "Your drinking is disappointing everyone who loves you.", Substance, Moderate),
        ContentItem::new(
            11,
            "Try being productive instead of refreshing your feed again.",
            SocialMedia,
            Mild,
        ),
        ContentItem::new(12, "Your willpower is weaker than your WiFi signal.", SocialMedia, Moderate),
        ContentItem::new(
            13,
            "Porn is eroding your ability to connect with real people.",
            Porn,
            Mild,
        ),
        ContentItem::new(14, "That cigarette shows how little you value your future.", Substance, Moderate),
        ContentItem::new(
            15,
            "Your social media habit is making you shallow and boring.",
            SocialMedia,
            Moderate,
        ),
    ]
}

fn reference_responses() -> ResponseBank {
    use Category::*;
    use PersonaStyle::*;

    let mut bank = ResponseBank::new();
    bank.insert(
        Parent,
        SocialMedia,
        &[
            "Still on TikTok? I expected more from you.",
            "Your sister got a promotion while you were scrolling Instagram.",
            "You're wasting your potential on social media. I'm not angry, just disappointed.",
            "I didn't raise you to be a dopamine addict.",
        ],
    );
    bank.insert(
        Parent,
        Porn,
        &[
            "You're killing your motivation with that stuff.",
            "What would your grandparents think of your browser history?",
            "This is why you never leave your room.",
            "Close the tab and come have dinner with the family.",
        ],
    );
    bank.insert(
        Parent,
        Substance,
        &[
            "Another cigarette? Your grandfather died of lung cancer.",
            "Drinking again? This is why you can't hold down a job.",
            "You smell like an ashtray.",
            "Wasting money on cigarettes when you can't even pay rent.",
        ],
    );
    bank.insert(
        Romantic,
        SocialMedia,
        &[
            "I left you because of your Instagram obsession. Still haven't changed?",
            "You cared more about likes than about us.",
            "Remember when you ruined our date by checking notifications?",
            "Nobody wants to date a TikTok zombie.",
        ],
    );
    bank.insert(
        Romantic,
        Porn,
        &[
            "This is why our intimacy suffered.",
            "Your habits ruined everything between us.",
            "You picked a screen over a real person. Every time.",
            "Is your laptop your only companion now?",
        ],
    );
    bank.insert(
        Romantic,
        Substance,
        &[
            "You chose cigarettes over me. How's that working out?",
            "The drinking made you unbearable.",
            "Your breath always bothered me.",
            "I'm with someone who doesn't need substances to function.",
        ],
    );
    bank.insert(
        Coach,
        SocialMedia,
        &[
            "PUT DOWN THE PHONE AND PICK UP YOUR LIFE!",
            "ONE MORE SCROLL AND YOU DROP AND GIVE ME 20!",
            "INSTAGRAM WON'T BUILD YOUR FUTURE! MOVE IT!",
            "YOUR COMPETITORS ARE WORKING WHILE YOU'RE SCROLLING!",
        ],
    );
    bank.insert(
        Coach,
        Porn,
        &[
            "THAT HABIT IS KILLING YOUR GAINS!",
            "REAL CHAMPIONS DON'T WASTE ENERGY ON PIXELS!",
            "GET UP AND CHANNEL THAT ENERGY INTO SOMETHING PRODUCTIVE!",
            "EVERY TIME YOU RELAPSE, YOU RESET YOUR PROGRESS TO ZERO!",
        ],
    );
    bank.insert(
        Coach,
        Substance,
        &[
            "THAT CIGARETTE IS STEALING YOUR LUNG CAPACITY!",
            "ALCOHOL IS SABOTAGING YOUR RECOVERY!",
            "EACH PUFF ADDS A MINUTE TO YOUR MILE TIME!",
            "YOUR BODY IS A TEMPLE, NOT A DUMPSTER!",
        ],
    );
    bank
}

fn reference_personas() -> Vec<Persona> {
    vec![
        Persona::new(
            "bully_mom",
            "Bully Mom",
            "Your disapproving mother who thinks you can do better",
            PersonaStyle::Parent,
        ),
        Persona::new(
            "bully_dad",
            "Bully Dad",
            "Your demanding father who expects more from you",
            PersonaStyle::Parent,
        ),
        Persona::new(
            "bully_ex",
            "Bully Ex",
            "Your ex who knows all your weaknesses",
            PersonaStyle::Romantic,
        ),
        Persona::new(
            "bully_coach",
            "Bully Coach",
            "Your tough personal trainer who pushes you to your limits",
            PersonaStyle::Coach,
        ),
    ]
}
