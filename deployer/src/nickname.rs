//! Deterministic, memorable names for addresses.

use alloy::primitives::{Address, U256};

const ADJECTIVES: [&str; 87] = [
    "Adorable", "Adventurous", "Aggressive", "Agreeable", "Alert", "Alive", "Amazing", "Angry",
    "Awesome", "Beautiful", "Blissful", "Brave", "Calm", "Careful", "Clever", "Colorful", "Cool",
    "Courageous", "Dazzling", "Dependable", "Determined", "Eager", "Elastic", "Elegant",
    "Energetic", "Enthusiastic", "Excellent", "Excited", "Fantastic", "Fierce", "Friendly", "Funny",
    "Gentle", "Gifted", "Glamorous", "Great", "Happy", "Healthy", "Helpful", "Hilarious",
    "Important", "Inquisitive", "Jolly", "Kind", "Lively", "Lovely", "Lucky", "Modern", "Modest",
    "Muscular", "Nice", "Optimistic", "Peaceful", "Perfect", "Playful", "Polite", "Proud", "Quick",
    "Quiet", "Quirky", "Relaxed", "Resourceful", "Responsible", "Romantic", "Sad", "Serene",
    "Sharp", "Silly", "Sleepy", "Smart", "Smiling", "Social", "Sophisticated", "Sporty", "Steady",
    "Strong", "Successful", "Super", "Talented", "Thoughtful", "Trusting", "Upbeat", "Vibrant",
    "Vigilant", "Witty", "Wonderful", "Zealous",
];

const NOUNS: [&str; 108] = [
    "Account", "Address", "Airplane", "Animal", "Apple", "Baby", "Ball", "Bank", "Bar", "Bear",
    "Bed", "Beer", "Bike", "Bird", "Boat", "Book", "Boy", "Bread", "Brother", "Bus", "Butter",
    "Car", "Cat", "Chair", "Cheese", "Child", "Church", "City", "Cow", "Cup", "Dog", "Door", "Duck",
    "Egg", "Elephant", "Eye", "Factory", "Father", "Fish", "Girl", "Girl", "Goat", "Gold", "Grass",
    "Guy", "Hamster", "Horse", "House", "Ice", "Jacket", "Jar", "Kid", "Knife", "Lake", "Lamp",
    "Leaf", "Leg", "Lion", "Man", "Map", "Mother", "Mouse", "Mouth", "Mountain", "Name", "Neck",
    "Nose", "Ocean", "Orange", "Oven", "Paper", "Parrot", "Pen", "Pencil", "Person", "Pig", "Pond",
    "Potato", "Queen", "River", "Road", "Rock", "Roof", "Rose", "Sea", "Sheep", "Shirt", "Shoe",
    "Sky", "Snake", "Sock", "Spider", "Spoon", "Star", "Street", "Sun", "Table", "Tea", "Teacher",
    "Tent", "Tree", "Truck", "Umbrella", "Wall", "Water", "Wheel", "Window", "Wood",
];

/// Maps an address to an "Adjective Noun" pair. Each word is picked by the
/// address, read as an unsigned integer, modulo the length of its list.
pub fn nickname(address: Address) -> String {
    let value = U256::from_be_slice(address.as_slice());
    let adjective = ADJECTIVES[word_index(value, ADJECTIVES.len())];
    let noun = NOUNS[word_index(value, NOUNS.len())];

    format!("{adjective} {noun}")
}

fn word_index(value: U256, len: usize) -> usize {
    (value % U256::from(len)).to::<usize>()
}
