pub mod hacker_news;
