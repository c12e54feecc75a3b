//! Word lists backing the named grammar functions.

pub(crate) const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Archie", "Beatrice", "Caleb", "Clara", "Dmitri", "Edith", "Elena", "Felix",
    "Grace", "Hector", "Imani", "Ivan", "Jonah", "Keiko", "Laila", "Marcus", "Nadia", "Oscar",
    "Philip", "Priya", "Quentin", "Rosa", "Samir", "Tessa", "Umar", "Vera", "Wendell", "Yara",
    "Zoe",
];

pub(crate) const LAST_NAMES: &[&str] = &[
    "Abbott", "Baptiste", "Casper", "Delgado", "Eriksen", "Fontaine", "Gallagher", "Hartmann",
    "Ishikawa", "Jovanovic", "Kowalski", "Lindqvist", "Mitchell", "Nakamura", "Okafor", "Petrov",
    "Quintero", "Rasmussen", "Stroman", "Thornton", "Ulrich", "Vasquez", "Whitaker", "Xiong",
    "Yilmaz", "Zimmerman",
];

pub(crate) const WORDS: &[&str] = &[
    "amber", "anchor", "basil", "beacon", "cobalt", "canyon", "delta", "ember", "fable", "fjord",
    "galaxy", "harbor", "indigo", "juniper", "kernel", "lantern", "meadow", "nimbus", "orbit",
    "pebble", "quartz", "ripple", "saffron", "timber", "umbra", "velvet", "willow", "zephyr",
];

pub(crate) const HOBBIES: &[&str] = &[
    "Archery", "Baking", "Birdwatching", "Calligraphy", "Curling", "Cycling", "Fishkeeping",
    "Gardening", "Geocaching", "Knitting", "Origami", "Pottery", "Rock climbing", "Slot car",
    "Stargazing", "Woodworking",
];

pub(crate) const PET_NAMES: &[&str] = &[
    "Archie", "Bella", "Biscuit", "Coco", "Daisy", "Ginger", "Luna", "Milo", "Nala", "Oreo",
    "Pepper", "Rocky", "Simba", "Teddy", "Waffles",
];

pub(crate) const ANIMALS: &[&str] = &[
    "badger", "cat", "dog", "ferret", "gecko", "hamster", "lynx", "otter", "parrot", "rabbit",
    "tortoise", "wombat",
];

pub(crate) const COLORS: &[&str] = &[
    "Aqua", "Beige", "Crimson", "Fuchsia", "Gold", "Indigo", "Lavender", "Maroon", "Olive",
    "Salmon", "Teal", "Turquoise",
];

pub(crate) const CITIES: &[&str] = &[
    "Accra", "Bergen", "Cordoba", "Dresden", "Fukuoka", "Guadalajara", "Hobart", "Izmir", "Kraków",
    "Lyon", "Mombasa", "Porto", "Quebec", "Tampere", "Valparaíso",
];

pub(crate) const COUNTRIES: &[&str] = &[
    "Argentina", "Canada", "Denmark", "Ghana", "Japan", "Kenya", "Mexico", "New Zealand",
    "Norway", "Poland", "Portugal", "Turkey",
];

pub(crate) const STREET_SUFFIXES: &[&str] = &[
    "Avenue", "Boulevard", "Court", "Drive", "Lane", "Parkway", "Road", "Street", "Way",
];

pub(crate) const TLDS: &[&str] = &["biz", "com", "info", "io", "net", "org"];
