use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

const MAX_MESSAGE_CHARS: usize = 500;
/// Oldest messages past this are dropped from a transcript
pub const MAX_TRANSCRIPT_MESSAGES: usize = 100;

/// One row of the keyword lookup table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRule {
    pub topic: String,
    /// Lower-case fragments; the input is padded with a space on each side,
    /// so `" hi "` only matches the standalone word
    pub keywords: Vec<String>,
    pub response: String,
    pub quick_replies: Vec<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub quick_replies: Vec<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Shopper,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message is longer than {0} characters")]
    TooLong(usize),
}

/// Rule-based support bot: first matching rule by priority wins
pub struct ChatBot {
    rules: Vec<ChatRule>,
    fallback: ChatReply,
}

impl ChatBot {
    pub fn new(rules: Vec<ChatRule>, fallback: ChatReply) -> Self {
        let mut rules = rules;
        rules.sort_by_key(|r| -r.priority);
        Self { rules, fallback }
    }

    pub fn reply(&self, input: &str) -> Result<ChatReply, ChatError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::TooLong(MAX_MESSAGE_CHARS));
        }

        let normalized: String = trimmed
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let haystack = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));

        let reply = self
            .rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|rule| ChatReply {
                text: rule.response.clone(),
                quick_replies: rule.quick_replies.clone(),
                topic: Some(rule.topic.clone()),
            })
            .unwrap_or_else(|| self.fallback.clone());

        Ok(reply)
    }

    pub fn greeting(&self) -> ChatReply {
        ChatReply {
            text: "Hi! I'm Biscuit, the PawMart helper. Ask me about orders, shipping, returns or our pets.".to_string(),
            quick_replies: vec![
                "Track my order".to_string(),
                "Shipping costs".to_string(),
                "Adopt a pet".to_string(),
            ],
            topic: Some("greeting".to_string()),
        }
    }
}

impl Default for ChatBot {
    fn default() -> Self {
        Self::new(
            default_rules(),
            ChatReply {
                text: "Sorry, I didn't catch that. Try asking about orders, shipping, returns, payments or pets, or type 'agent' to reach our team.".to_string(),
                quick_replies: vec!["Talk to an agent".to_string()],
                topic: None,
            },
        )
    }
}

fn rule(topic: &str, keywords: &[&str], response: &str, quick_replies: &[&str], priority: i32) -> ChatRule {
    ChatRule {
        topic: topic.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        response: response.to_string(),
        quick_replies: quick_replies.iter().map(|q| q.to_string()).collect(),
        priority,
    }
}

pub fn default_rules() -> Vec<ChatRule> {
    vec![
        rule(
            "cancel",
            &["cancel"],
            "You can cancel an order from My Orders while it is pending, confirmed or processing. Once shipped, start a return instead.",
            &["Return policy"],
            100,
        ),
        rule(
            "order_status",
            &["track", "where is my order", "order status", "my order"],
            "Open My Orders to see the live status of each order. Orders move from pending to confirmed, processing, shipped and delivered.",
            &["Cancel an order", "Shipping times"],
            90,
        ),
        rule(
            "returns",
            &["return", "refund", "exchange"],
            "Unopened supplies can be returned within 30 days for a full refund. Live animals are covered by our 14-day health guarantee.",
            &["Talk to an agent"],
            80,
        ),
        rule(
            "promo",
            &["promo", "coupon", "discount", "offer", "code"],
            "Try WELCOME10 for 10% off your first order, PAWS20 for 20% off orders over $100, or FREESHIP for free shipping over $25.",
            &["Shipping costs"],
            70,
        ),
        rule(
            "shipping",
            &["ship", "delivery", "deliver", "courier"],
            "Shipping is free on orders of $49 or more after discounts; otherwise it is a flat $5.99. Most orders arrive in 3 to 5 business days.",
            &["Track my order"],
            60,
        ),
        rule(
            "payment",
            &["pay", "card", "upi", "cash"],
            "We accept cards, UPI and cash on delivery. Payment is confirmed at checkout.",
            &[],
            50,
        ),
        rule(
            "pets",
            &["adopt", "puppy", "kitten", "pet for sale", " dog ", " cat ", "breed"],
            "Browse the Pets section to filter by species, breed, age and vaccination status. Every pet comes with a health record.",
            &["Vaccinations"],
            40,
        ),
        rule(
            "health",
            &["vaccin", " vet ", "sick", "health"],
            "Vaccination status is listed on each pet profile. For medical concerns please contact a licensed vet.",
            &[],
            35,
        ),
        rule(
            "food",
            &["food", "diet", "feed", "treat"],
            "Check the Food and Treats categories and filter by pet type. Our top rated pick for dogs is the grain-free chicken kibble.",
            &[],
            30,
        ),
        rule(
            "agent",
            &["agent", "human", "support", "contact", "help"],
            "Our care team is available 9am to 6pm, Monday to Saturday, at support@pawmart.example or 1-800-PAW-MART.",
            &[],
            20,
        ),
        rule(
            "thanks",
            &["thank", "thx"],
            "Happy to help! Give your pet a scratch from us.",
            &[],
            10,
        ),
        rule(
            "greeting",
            &[" hi ", " hello ", " hey ", "good morning", "good evening"],
            "Hello! How can I help you and your pet today?",
            &["Track my order", "Shipping costs", "Adopt a pet"],
            5,
        ),
        rule(
            "goodbye",
            &[" bye ", "goodbye", "see you"],
            "Bye for now! Come back any time.",
            &[],
            5,
        ),
    ]
}

/// Per-shopper chat transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Record the shopper's message and the bot's answer
    pub fn exchange(&mut self, bot: &ChatBot, input: &str) -> Result<ChatReply, ChatError> {
        let reply = bot.reply(input)?;
        let now = Utc::now();
        self.messages.push(ChatMessage {
            sender: Sender::Shopper,
            text: input.trim().to_string(),
            sent_at: now,
        });
        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            text: reply.text.clone(),
            sent_at: now,
        });
        self.trim();
        Ok(reply)
    }

    /// Add messages carried over from another session
    pub fn append(&mut self, messages: Vec<ChatMessage>) {
        self.messages.extend(messages);
        self.messages.sort_by_key(|m| m.sent_at);
        self.trim();
    }

    fn trim(&mut self) {
        let excess = self.messages.len().saturating_sub(MAX_TRANSCRIPT_MESSAGES);
        if excess > 0 {
            self.messages.drain(..excess);
        }
    }
}
