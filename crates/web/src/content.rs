//! Built-in site content.
//!
//! Site identity is compiled in. With `MOCK_MODE=true` the home page shows
//! the fixture gallery instead of catalog products and the contact page shows
//! the fixture contact details, so the front end can be previewed without a
//! populated database.

/// Site identity used by every page.
#[derive(Debug, Clone, Copy)]
pub struct SiteConfig {
    pub site_name: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    pub artist_name: &'static str,
    pub artist_bio: &'static str,
}

/// A home page gallery tile.
#[derive(Debug, Clone, Copy)]
pub struct GalleryItem {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    /// CSS colour for the placeholder swatch.
    pub color: &'static str,
    pub image_url: Option<&'static str>,
}

/// Contact details shown above the contact form.
#[derive(Debug, Clone, Copy)]
pub struct ContactInfo {
    pub email: &'static str,
    pub message: &'static str,
}

pub const SITE: SiteConfig = SiteConfig {
    site_name: "The Crocheted Crumb",
    tagline: "Handcrafted with Love",
    description: "Cozy, cute, and custom crochet creations for you and your loved ones.",
    artist_name: "Sarah",
    artist_bio: "Welcome to The Crocheted Crumb! I'm Sarah, and I turn yarn into keepsakes. \
                 Every stitch is made with care and patience. Whether you're looking for a \
                 unique gift or a treat for yourself, I hope you find something that brings \
                 you joy.",
};

pub const GALLERY: [GalleryItem; 3] = [
    GalleryItem {
        id: 1,
        title: "Plushies",
        description: "Adorable handmade plush toys",
        color: "#E8D5C4",
        image_url: None,
    },
    GalleryItem {
        id: 2,
        title: "Wearables",
        description: "Cozy crocheted accessories",
        color: "#B0C4B1",
        image_url: None,
    },
    GalleryItem {
        id: 3,
        title: "Home Decor",
        description: "Beautiful home decorations",
        color: "#D7B9B3",
        image_url: None,
    },
];

pub const CONTACT: ContactInfo = ContactInfo {
    email: "hello@crochetedcrumb.test",
    message: "Email me for any questions, product requests, or to talk about a commission! \
              Thanks for reaching out! -Sarah",
};

/// Gallery tiles for the home page, present only in mock mode.
#[must_use]
pub fn gallery(mock_mode: bool) -> &'static [GalleryItem] {
    if mock_mode { &GALLERY } else { &[] }
}

/// Contact details, present only in mock mode.
#[must_use]
pub const fn contact(mock_mode: bool) -> Option<&'static ContactInfo> {
    if mock_mode { Some(&CONTACT) } else { None }
}
